// ajaxform-server - axum integration for AJAX form validation

pub mod error;
pub mod request;
pub mod response;
pub mod routes;

pub use error::AppError;
pub use request::{decode_form_body, decode_multipart};
pub use response::AjaxValidatorJson;
pub use routes::{app, app_with_config, validate_registration};
