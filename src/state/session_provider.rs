// ============================================================================
// SESSION PROVIDER - Usuario actual inyectado a quien lo necesite
// ============================================================================
// Se lee localStorage UNA vez al arrancar; después todos los consumidores
// reciben un clon de este provider (Rc compartido), nunca releen storage.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use gloo_storage::{LocalStorage, Storage};

use crate::models::User;
use crate::utils::constants::USER_STORAGE_KEY;

#[derive(Clone, Default)]
pub struct SessionProvider {
    user: Rc<RefCell<Option<User>>>,
    checked_in_on: Rc<RefCell<Option<NaiveDate>>>,
}

impl SessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: User) -> Self {
        let provider = Self::new();
        provider.set_user(Some(user));
        provider
    }

    /// Restaurar usuario guardado por la pantalla de login
    pub fn restore() -> Self {
        match LocalStorage::get::<User>(USER_STORAGE_KEY) {
            Ok(user) => {
                log::info!("💾 [SESSION] Usuario restaurado: {}", user.id);
                Self::with_user(user)
            }
            Err(e) => {
                log::info!("👤 [SESSION] Sin usuario en storage ({})", e);
                Self::new()
            }
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.borrow().is_some()
    }

    pub fn set_user(&self, user: Option<User>) {
        let changed = self.user.borrow().as_ref().map(|u| &u.id) != user.as_ref().map(|u| &u.id);
        *self.user.borrow_mut() = user;
        // La asistencia de hoy es por usuario
        if changed {
            *self.checked_in_on.borrow_mut() = None;
        }
    }

    /// Logout - limpiar memoria y storage
    pub fn logout(&self) {
        self.set_user(None);
        LocalStorage::delete(USER_STORAGE_KEY);
    }

    pub fn mark_checked_in(&self, date: NaiveDate) {
        *self.checked_in_on.borrow_mut() = Some(date);
    }

    pub fn mark_checked_in_today(&self) {
        self.mark_checked_in(today());
    }

    pub fn is_checked_in_on(&self, date: NaiveDate) -> bool {
        *self.checked_in_on.borrow() == Some(date)
    }

    pub fn checked_in_today(&self) -> bool {
        self.is_checked_in_on(today())
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: "Test".to_string(),
            department: None,
        }
    }

    #[test]
    fn clones_share_the_same_session() {
        let provider = SessionProvider::new();
        let consumer = provider.clone();

        provider.set_user(Some(user("u-1")));

        assert_eq!(consumer.current_user().map(|u| u.id), Some("u-1".to_string()));
        assert!(consumer.is_logged_in());
    }

    #[test]
    fn check_in_flag_is_per_day() {
        let provider = SessionProvider::with_user(user("u-1"));
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        provider.mark_checked_in(sunday);

        assert!(provider.is_checked_in_on(sunday));
        assert!(!provider.is_checked_in_on(sunday.succ_opt().unwrap()));
    }

    #[test]
    fn switching_user_clears_check_in_flag() {
        let provider = SessionProvider::with_user(user("u-1"));
        provider.mark_checked_in_today();
        assert!(provider.checked_in_today());

        provider.set_user(Some(user("u-1")));
        assert!(provider.checked_in_today());

        provider.set_user(Some(user("u-2")));
        assert!(!provider.checked_in_today());
    }
}
