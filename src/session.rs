use crate::errors::{AppError, AppResult};
use crate::models::UserAccount;

/// The logged-in user, handed explicitly to every operation that acts on
/// someone's behalf.
#[derive(Debug, Clone)]
pub struct Session {
    user: UserAccount,
}

impl Session {
    pub fn new(user: UserAccount) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &UserAccount {
        &self.user
    }

    pub fn display_name(&self) -> &str {
        if self.user.username.trim().is_empty() {
            &self.user.cpf
        } else {
            &self.user.username
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.user.is_admin {
            Ok(())
        } else {
            Err(AppError::Policy(format!(
                "user '{}' is not an administrator",
                self.display_name()
            )))
        }
    }

    pub(crate) fn refresh(&mut self, user: UserAccount) {
        self.user = user;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> UserAccount {
        UserAccount {
            cpf: "52998224725".to_string(),
            username: "Ana".to_string(),
            email: String::new(),
            telefone: String::new(),
            cep: "01310100".to_string(),
            bairro: "Centro".to_string(),
            senha: "x".to_string(),
            is_admin,
            seguindo: Vec::new(),
        }
    }

    #[test]
    fn citizens_fail_admin_check() {
        let error = Session::new(user(false)).require_admin().expect_err("citizen");
        assert!(error.to_string().starts_with("POLICY_DENIED"));
        assert!(Session::new(user(true)).require_admin().is_ok());
    }

    #[test]
    fn display_name_falls_back_to_cpf() {
        let mut anonymous = user(false);
        anonymous.username = String::new();
        assert_eq!(Session::new(anonymous).display_name(), "52998224725");
    }
}
