use super::*;
use crate::color::SimpleColorManager;
use std::{cell::RefCell, rc::Rc};

#[test]
fn progress_steps() {
    let calls = Rc::new(RefCell::new(vec![]));
    let c = calls.clone();
    let mut p = ProgressReporter::new(move |f| c.borrow_mut().push(f));
    for i in 0..=100 {
        p.report(i, 100);
    }
    let calls = calls.borrow();
    assert_eq!(Some(&0.0), calls.first());
    assert_eq!(Some(&1.0), calls.last());
    assert!(calls.len() <= 21);
    assert!(calls.windows(2).all(|w| w[1] - w[0] >= PROGRESS_STEP - 1e-12 || w[1] == 1.0));
}

#[test]
fn progress_without_callback() {
    let mut p = ProgressReporter::default();
    p.report(1, 2);
}

#[test]
fn session_absorbs_local_errors() {
    let cms = SimpleColorManager::new();
    let mut diag = CollectDiagnostics::default();
    {
        let mut s = Session::new(&cms, &mut diag);
        let r: Result<Option<()>, _> = s.absorb(Err(ConvertError::unsupported("polymarker")));
        assert_eq!(Ok(None), r);
        let r = s.absorb(Err::<(), _>(ConvertError::structural(0, 0, "bad")));
        assert!(r.is_err());
        assert_eq!(Ok(Some(1)), s.absorb(Ok(1)));
        s.error("boom");
    }
    assert_eq!(vec!["unsupported feature: polymarker".to_owned()], diag.warnings);
    assert_eq!(vec!["boom".to_owned()], diag.errors);
}

#[test_log::test]
fn log_diagnostics() {
    let mut d = LogDiagnostics;
    d.warn("warn message");
    d.error("error message");
}
