/// Stamps the current file and line, for use with `.with_context(|| format_dbg!())`
/// so that failures deep in the solver carry a breadcrumb back to the call site.
#[macro_export]
macro_rules! format_dbg {
    () => {
        format!("{}:{}", file!(), line!())
    };
    ($value:expr) => {
        format!("{}:{}\n{}: {:?}", file!(), line!(), stringify!($value), $value)
    };
}
