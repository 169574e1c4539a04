use crate::errors::{AppError, AppResult};
use crate::models::{EditUserRequest, RegisterUserRequest, UserAccount};
use crate::persistence::{read_json_document, read_json_or_default, write_json_atomic};
use crate::validation::{only_digits, require_fields, validate_cep, validate_cpf, validate_email};
use std::path::{Path, PathBuf};

/// `usuarios.json`: an array of accounts keyed by CPF. CPFs are compared
/// and stored as digits only, so `529.982.247-25` and `52998224725` are the
/// same account.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    path: PathBuf,
}

impl UserDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_all(&self) -> Vec<UserAccount> {
        read_json_or_default(&self.path)
    }

    /// Refuses to replace a document that exists but does not parse.
    pub fn save_all(&self, users: &[UserAccount]) -> AppResult<()> {
        read_json_document::<Vec<UserAccount>>(&self.path)?;
        write_json_atomic(&self.path, &users)
    }

    pub fn get(&self, cpf: &str) -> Option<UserAccount> {
        let cpf = only_digits(cpf);
        self.load_all().into_iter().find(|user| same_cpf(user, &cpf))
    }

    pub fn register(&self, request: RegisterUserRequest) -> AppResult<UserAccount> {
        require_fields(&[
            ("username", request.username.as_str()),
            ("cpf", request.cpf.as_str()),
            ("cep", request.cep.as_str()),
            ("senha", request.senha.as_str()),
        ])?;
        if !validate_cpf(&request.cpf) {
            return Err(AppError::Validation("CPF is invalid".to_string()));
        }
        if !validate_cep(&request.cep) {
            return Err(AppError::Validation("CEP is invalid".to_string()));
        }
        if !validate_email(&request.email) {
            return Err(AppError::Validation("e-mail is invalid".to_string()));
        }

        let cpf = only_digits(&request.cpf);
        let mut users = self.load_all();
        if users.iter().any(|user| same_cpf(user, &cpf)) {
            return Err(AppError::Conflict(format!(
                "a user with CPF '{}' already exists",
                cpf
            )));
        }

        let user = UserAccount {
            cpf,
            username: request.username.trim().to_string(),
            email: request.email.trim().to_string(),
            telefone: request.telefone,
            cep: request.cep,
            bairro: request.bairro,
            senha: request.senha,
            is_admin: false,
            seguindo: Vec::new(),
        };
        users.push(user.clone());
        self.save_all(&users)?;
        tracing::info!(username = %user.username, "user registered");
        Ok(user)
    }

    pub fn authenticate(&self, cpf: &str, senha: &str) -> Option<UserAccount> {
        let cpf = only_digits(cpf);
        self.load_all()
            .into_iter()
            .find(|user| same_cpf(user, &cpf) && user.senha == senha)
    }

    /// Blank or absent values keep what is on file.
    pub fn edit(&self, request: EditUserRequest) -> AppResult<UserAccount> {
        let cpf = only_digits(&request.cpf);
        let mut users = self.load_all();
        let user = users
            .iter_mut()
            .find(|user| same_cpf(user, &cpf))
            .ok_or_else(|| AppError::NotFound(format!("user '{}' not found", request.cpf)))?;
        if let Some(username) = non_blank(request.username) {
            user.username = username;
        }
        if let Some(bairro) = non_blank(request.bairro) {
            user.bairro = bairro;
        }
        let updated = user.clone();
        self.save_all(&users)?;
        Ok(updated)
    }

    pub fn replace(&self, updated: &UserAccount) -> AppResult<()> {
        let mut users = self.load_all();
        let cpf = only_digits(&updated.cpf);
        let slot = users
            .iter_mut()
            .find(|user| same_cpf(user, &cpf))
            .ok_or_else(|| AppError::NotFound(format!("user '{}' not found", updated.cpf)))?;
        *slot = updated.clone();
        self.save_all(&users)
    }
}

fn same_cpf(user: &UserAccount, digits: &str) -> bool {
    !digits.is_empty() && only_digits(&user.cpf) == digits
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_directory() -> (tempfile::TempDir, UserDirectory) {
        let dir = tempfile::tempdir().expect("temp data dir");
        let users = UserDirectory::new(dir.path().join("usuarios.json"));
        (dir, users)
    }

    fn request(cpf: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: "Ana Souza".to_string(),
            email: String::new(),
            telefone: "11 99999-0000".to_string(),
            cpf: cpf.to_string(),
            cep: "01310-100".to_string(),
            bairro: "Bela Vista".to_string(),
            senha: "segredo".to_string(),
        }
    }

    #[test]
    fn register_and_authenticate() {
        let (_dir, users) = temp_directory();
        let created = users.register(request("52998224725")).expect("register");
        assert!(!created.is_admin);
        assert!(created.seguindo.is_empty());

        assert!(users.authenticate("52998224725", "segredo").is_some());
        assert!(users.authenticate("52998224725", "errada").is_none());
    }

    #[test]
    fn duplicate_and_invalid_cpfs_are_rejected() {
        let (_dir, users) = temp_directory();
        users.register(request("52998224725")).expect("register");

        let duplicate = users.register(request("52998224725")).expect_err("duplicate cpf");
        assert!(duplicate.to_string().contains("CONFLICT"));

        let invalid = users.register(request("12345678900")).expect_err("invalid cpf");
        assert!(invalid.to_string().contains("VALIDATION_FAILED"));
    }

    #[test]
    fn punctuated_cpf_is_the_same_account() {
        let (_dir, users) = temp_directory();
        users.register(request("52998224725")).expect("register");

        let duplicate = users
            .register(request("529.982.247-25"))
            .expect_err("same cpf with punctuation");
        assert!(duplicate.to_string().contains("CONFLICT"));
        assert_eq!(users.load_all().len(), 1);

        let user = users
            .authenticate("529.982.247-25", "segredo")
            .expect("punctuated login");
        assert_eq!(user.cpf, "52998224725");
        assert!(users.get(" 529.982.247-25 ").is_some());
    }

    #[test]
    fn punctuated_cpf_is_stored_as_digits() {
        let (_dir, users) = temp_directory();
        let created = users.register(request("529.982.247-25")).expect("register");
        assert_eq!(created.cpf, "52998224725");
    }

    #[test]
    fn malformed_directory_is_not_overwritten() {
        let (_dir, users) = temp_directory();
        fs::write(users.path(), r#"[{"cpf": 52998224725}]"#).expect("write users");

        assert!(users.load_all().is_empty());
        let error = users
            .register(request("11144477735"))
            .expect_err("write refused");
        assert!(error.to_string().starts_with("CONFLICT"));
        assert_eq!(
            fs::read_to_string(users.path()).expect("read users"),
            r#"[{"cpf": 52998224725}]"#
        );
    }

    #[test]
    fn edit_keeps_blank_fields() {
        let (_dir, users) = temp_directory();
        users.register(request("52998224725")).expect("register");

        let edited = users
            .edit(EditUserRequest {
                cpf: "52998224725".to_string(),
                username: Some("  ".to_string()),
                bairro: Some("Consolação".to_string()),
            })
            .expect("edit");
        assert_eq!(edited.username, "Ana Souza");
        assert_eq!(edited.bairro, "Consolação");
        assert_eq!(users.get("52998224725").expect("stored").bairro, "Consolação");
    }

    #[test]
    fn accounts_without_follow_list_load() {
        let (_dir, users) = temp_directory();
        fs::write(
            users.path(),
            r#"[{"username": "adm", "cpf": "1", "senha": "x", "is_admin": true}]"#,
        )
        .expect("write users");
        let admin = users.authenticate("1", "x").expect("admin login");
        assert!(admin.is_admin);
        assert!(admin.seguindo.is_empty());
    }
}
