use std::fmt;

/// Processor privilege mode.
///
/// The executor consults this to decide whether privileged instructions
/// are legal; exception dispatch flips it for the duration of a trap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrivilegeMode {
    #[default]
    User,
    System,
}

impl fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeMode::User => f.write_str("user"),
            PrivilegeMode::System => f.write_str("system"),
        }
    }
}
