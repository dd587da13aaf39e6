//! Who is using the app right now.
//!
//! The active identity is mirrored into the substrate as two mutually
//! exclusive markers: `pm_user` holds a registered user record and `pm_guest`
//! holds the literal `"true"` while a guest session is active.

use lazy_regex::regex_is_match;
use tracing::{info, warn};
use ulid::Ulid;

use crate::error::{Error, FieldErrors, Result};
use crate::models::{Identity, User};
use crate::storage::Substrate;

pub const USER_KEY: &str = "pm_user";
pub const GUEST_KEY: &str = "pm_guest";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    active: Option<Identity>,
}

impl Session {
    /// Rebuilds the session from the persisted markers.
    ///
    /// A readable user record wins over the guest flag; an unreadable one is
    /// ignored.
    pub fn restore(substrate: &impl Substrate) -> Session {
        if let Some(raw) = substrate.get(USER_KEY) {
            match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    info!(user = %user.id, "restored registered session");
                    return Session {
                        active: Some(Identity::Registered(user)),
                    };
                }
                Err(e) => warn!("ignoring unreadable {USER_KEY} record: {e}"),
            }
        }
        if substrate.get(GUEST_KEY).as_deref() == Some("true") {
            info!("restored guest session");
            return Session {
                active: Some(Identity::Guest),
            };
        }
        Session::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.active.as_ref()
    }

    pub fn identity_id(&self) -> Option<&str> {
        self.active.as_ref().map(Identity::id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_guest(&self) -> bool {
        self.active.as_ref().is_some_and(Identity::is_guest)
    }

    /// Signs in a new registered user after validating the form fields.
    ///
    /// Rejected input leaves both the session and the substrate untouched.
    pub fn authenticate(
        &mut self,
        substrate: &mut impl Substrate,
        name: &str,
        email: &str,
    ) -> Result<&Identity> {
        let errors = validate_sign_in(name, email);
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        let user = User {
            id: Ulid::new().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            avatar: None,
        };
        let record = serde_json::to_string(&user)?;
        let written = substrate
            .remove(GUEST_KEY)
            .and_then(|()| substrate.set(USER_KEY, record));
        if let Err(e) = written {
            self.resync(&*substrate);
            return Err(e);
        }
        info!(user = %user.id, "signed in");
        Ok(&*self.active.insert(Identity::Registered(user)))
    }

    pub fn continue_as_guest(&mut self, substrate: &mut impl Substrate) -> Result<&Identity> {
        let written = substrate
            .remove(USER_KEY)
            .and_then(|()| substrate.set(GUEST_KEY, "true".to_string()));
        if let Err(e) = written {
            self.resync(&*substrate);
            return Err(e);
        }
        info!("continuing as guest");
        Ok(&*self.active.insert(Identity::Guest))
    }

    pub fn end_session(&mut self, substrate: &mut impl Substrate) -> Result<()> {
        let cleared = substrate
            .remove(USER_KEY)
            .and_then(|()| substrate.remove(GUEST_KEY));
        if let Err(e) = cleared {
            self.resync(&*substrate);
            return Err(e);
        }
        if self.active.take().is_some() {
            info!("signed out");
        }
        Ok(())
    }

    /// Re-reads the markers after a failed write so the in-memory identity
    /// never disagrees with what the next start would restore.
    fn resync(&mut self, substrate: &impl Substrate) {
        self.active = Session::restore(substrate).active;
        warn!(identity = ?self.identity_id(), "marker write failed, session re-read");
    }
}

/// Checks the sign-in form; an empty result means the input is acceptable.
pub fn validate_sign_in(name: &str, email: &str) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if name.trim().is_empty() {
        errors.name = Some("Name is required".to_string());
    }
    let email = email.trim();
    if email.is_empty() {
        errors.email = Some("Email is required".to_string());
    } else if !regex_is_match!(r"\S+@\S+\.\S+", email) {
        errors.email = Some("Invalid email format".to_string());
    }
    errors
}
