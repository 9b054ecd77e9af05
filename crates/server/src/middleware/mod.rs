pub mod access_control;
pub mod request_id;

pub use access_control::{
    AuthError, PartnerClaims, PartnerContext, authorize, issue_token, require_partner,
};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
