pub mod breadcrumbs;
pub mod navigate;
pub mod runtime;

pub use breadcrumbs::{cmd_breadcrumbs, BreadcrumbsArgs, StoredLog};
pub use navigate::{cmd_navigate, NavigateArgs};
pub use runtime::init_logging;
