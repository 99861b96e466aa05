/// Renders an error and its whole source chain, one cause per line.
///
/// Used by the manual `Debug` implementations of our error enums so that
/// `{:?}` on a logged error shows every underlying cause, not only the top one.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;

    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }

    Ok(())
}
