use std::fmt;
use std::str::FromStr;

use crate::domain::AppError;

/// Licenses offered when scaffolding a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LicenseType {
    #[default]
    Mit,
    Isc,
    Apache2,
    Gpl3,
}

impl LicenseType {
    pub const ALL: [LicenseType; 4] =
        [LicenseType::Mit, LicenseType::Isc, LicenseType::Apache2, LicenseType::Gpl3];

    /// SPDX identifier written into `package.json`.
    pub fn spdx(self) -> &'static str {
        match self {
            LicenseType::Mit => "MIT",
            LicenseType::Isc => "ISC",
            LicenseType::Apache2 => "Apache-2.0",
            LicenseType::Gpl3 => "GPL-3.0",
        }
    }

    /// Embedded template holding the license text.
    pub fn template_name(self) -> &'static str {
        match self {
            LicenseType::Mit => "licenses/mit.txt.j2",
            LicenseType::Isc => "licenses/isc.txt.j2",
            LicenseType::Apache2 => "licenses/apache-2.0.txt.j2",
            LicenseType::Gpl3 => "licenses/gpl-3.0.txt.j2",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spdx())
    }
}

impl FromStr for LicenseType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LicenseType::ALL
            .into_iter()
            .find(|license| license.spdx().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                AppError::user_input(format!(
                    "Unknown license '{}': expected one of MIT, ISC, Apache-2.0, GPL-3.0",
                    value
                ))
            })
    }
}
