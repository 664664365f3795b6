mod blocklist;
mod change_password;

pub use blocklist::UrlBlocklistDecider;
pub use change_password::{
    ChangePasswordDecider, ResourceProbe, CHANGE_PASSWORD_PATH, NOT_EXIST_PROBE_PATH,
};
