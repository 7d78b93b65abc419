//! Legacy request-body compatibility shim.
//!
//! Older handlers read the acting user from a `user_id` field inside the
//! request body instead of the verified identity. This adapter copies the
//! authenticated subject into such payloads at the handler boundary,
//! overriding whatever the client sent, so those handlers keep working
//! without the authentication layer mutating bodies behind the scenes.

use crate::jwt_auth::UserId;

/// Payload types carrying the legacy `user_id` field
pub trait LegacyUserField {
    fn set_user_id(&mut self, user_id: String);
}

/// Copy the verified identity into a legacy payload.
pub fn inject_user_id<T: LegacyUserField>(identity: UserId, payload: &mut T) {
    payload.set_user_id(identity.0.to_string());
}
