use crate::domain::AppError;
use crate::ports::HostFramework;

/// Install the plugins the host framework ships for development.
pub fn execute<H: HostFramework>(host: &H) -> Result<(), AppError> {
    host.install_plugins()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHostFramework;

    #[test]
    fn runs_install_plugins_once() {
        let host = FakeHostFramework::new("/host");
        execute(&host).unwrap();
        assert_eq!(host.calls(), vec!["install_plugins"]);
    }
}
