use polar_domain::ErrorKind;
use std::borrow::Cow;

#[derive(Debug)]
struct UpstreamError;

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("upstream exploded")
    }
}

impl std::error::Error for UpstreamError {}

#[polar_derive::polar_error]
enum SampleError {
    #[kind(NotFound)]
    #[error("Missing{}: {message}", format_context(.context))]
    Missing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[kind(Unavailable)]
    #[error("Upstream{}: {source}", format_context(.context))]
    Upstream { source: UpstreamError, context: Option<Cow<'static, str>> },

    #[error("Internal{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn failing_upstream() -> Result<(), UpstreamError> {
    Err(UpstreamError)
}

#[test]
fn kinds_follow_variant_tags() {
    let missing = SampleError::Missing { message: "student".into(), context: None };
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let upstream: SampleError = UpstreamError.into();
    assert_eq!(upstream.kind(), ErrorKind::Unavailable);

    let internal: SampleError = "boom".into();
    assert_eq!(internal.kind(), ErrorKind::Internal);
}

#[test]
fn context_is_rendered_in_display() {
    let err = failing_upstream().context("Loading cart").unwrap_err();
    assert_eq!(err.to_string(), "Upstream (Loading cart): upstream exploded");

    let err: Result<(), SampleError> =
        Err(SampleError::Missing { message: "offering".into(), context: None });
    let err = err.context("CSE 214-01").unwrap_err();
    assert_eq!(err.to_string(), "Missing (CSE 214-01): offering");
}

#[test]
fn owned_strings_become_internal_errors() {
    let err: SampleError = format!("bad state {}", 7).into();
    assert!(matches!(err, SampleError::Internal { .. }));
    assert_eq!(err.to_string(), "Internal: bad state 7");
}
