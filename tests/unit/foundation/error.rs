use super::*;

#[test]
fn error_display_prefixes() {
    assert_eq!(
        TesseraError::validation("bad rect").to_string(),
        "validation error: bad rect"
    );
    assert_eq!(
        TesseraError::propagation("loop").to_string(),
        "propagation error: loop"
    );
    assert_eq!(
        TesseraError::render("boom").to_string(),
        "render error: boom"
    );
    assert_eq!(TesseraError::Aborted.to_string(), "render aborted");
}

#[test]
fn is_aborted_only_for_aborted() {
    assert!(TesseraError::Aborted.is_aborted());
    assert!(!TesseraError::render("boom").is_aborted());
    assert!(!TesseraError::Other(anyhow::anyhow!("io")).is_aborted());
}

#[test]
fn anyhow_errors_convert_transparently() {
    fn fails() -> TesseraResult<()> {
        Err(anyhow::anyhow!("underlying failure"))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.to_string(), "underlying failure");
}
