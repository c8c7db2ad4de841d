use camino::Utf8Path;

pub trait OptionPathExt {
    fn as_opt_path(&self) -> Option<&camino::Utf8Path>;
}

impl OptionPathExt for Option<camino::Utf8PathBuf> {
    fn as_opt_path(&self) -> Option<&camino::Utf8Path> {
        self.as_ref().map(|p| p.as_path())
    }
}

/// Resolves a configured binary override to the program name handed to
/// `Command::new`, falling back to looking up `default` on PATH.
pub fn bin_or_default<'a>(bin_path: Option<&'a Utf8Path>, default: &'a str) -> &'a str {
    bin_path.map(|p| p.as_str()).unwrap_or(default)
}
