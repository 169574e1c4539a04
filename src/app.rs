use crate::catalog;
use crate::errors::{AppError, AppResult};
use crate::ids::generate_id;
use crate::models::{
    AppSettings, CreateServiceRequest, EditUserRequest, ListServicesRequest, MigrationReport,
    NotificationItem, RegisterUserRequest, ServiceRecord, ServiceStatus, UserAccount,
};
use crate::normalize::PLACEHOLDER_ID;
use crate::notifications::project_notifications;
use crate::session::Session;
use crate::settings::load_settings;
use crate::store::{find_duplicate_in, RecordStore};
use crate::timestamps::{format_date, midnight_of};
use crate::updates::{append_update, set_status};
use crate::users::UserDirectory;
use crate::validation::require_fields;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Entry point for every front end: owns the two documents of a data
/// directory and applies the citizen and administrator operations to them.
#[derive(Debug, Clone)]
pub struct AppCore {
    data_dir: PathBuf,
    settings: AppSettings,
    services: RecordStore,
    users: UserDirectory,
}

impl AppCore {
    pub fn open(data_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|error| AppError::Io(error.to_string()))?;
        let settings = load_settings(&data_dir);
        let services = RecordStore::new(data_dir.join(&settings.services_file));
        let users = UserDirectory::new(data_dir.join(&settings.users_file));
        Ok(Self {
            data_dir,
            settings,
            services,
            users,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn services(&self) -> &RecordStore {
        &self.services
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn register(&self, request: RegisterUserRequest) -> AppResult<UserAccount> {
        self.users.register(request)
    }

    pub fn login(&self, cpf: &str, senha: &str) -> AppResult<Session> {
        let user = self
            .users
            .authenticate(cpf.trim(), senha)
            .ok_or_else(|| AppError::Policy("CPF or password is incorrect".to_string()))?;
        tracing::info!(username = %user.username, admin = user.is_admin, "user logged in");
        Ok(Session::new(user))
    }

    pub fn create_service(
        &self,
        session: &Session,
        request: CreateServiceRequest,
        now: NaiveDateTime,
    ) -> AppResult<ServiceRecord> {
        let title = request.title.trim().to_string();
        require_fields(&[
            ("title", title.as_str()),
            ("description", request.description.as_str()),
            ("address", request.address.as_str()),
            ("bairro", request.bairro.as_str()),
            ("type", request.service_type.as_str()),
        ])?;

        if self.services.contains_title(&title) {
            return Err(AppError::Conflict(format!(
                "a service titled '{}' already exists",
                title
            )));
        }
        let mut records = self.services.load_all();
        let service_type = request.service_type.trim().to_string();
        let cep = request
            .cep
            .map(|cep| cep.trim().to_string())
            .filter(|cep| !cep.is_empty());
        if let Some(cep) = cep.as_deref() {
            if let Some(existing) = find_duplicate_in(&records, cep, &service_type) {
                return Err(AppError::Conflict(format!(
                    "service '{}' ({}) already reports '{}' for this CEP",
                    existing.title, existing.id, existing.service_type
                )));
            }
        }

        let mut existing_ids: HashSet<String> =
            records.values().map(|record| record.id.clone()).collect();
        existing_ids.insert(PLACEHOLDER_ID.to_string());
        let date = format_date(now.date());
        let record = ServiceRecord {
            id: generate_id(&existing_ids),
            title: title.clone(),
            description: request.description.trim().to_string(),
            last_update: midnight_of(&date),
            date,
            address: format!(
                "{}, {}, {}",
                request.address.trim(),
                request.number.trim(),
                request.bairro.trim()
            ),
            image: request
                .image
                .map(|image| image.trim().to_string())
                .filter(|image| !image.is_empty())
                .unwrap_or_else(|| self.settings.default_image.clone()),
            status: ServiceStatus::Pending,
            service_type,
            cep,
            updates: Vec::new(),
        };
        records.insert(title, record.clone());
        self.services.save_all(&records)?;
        tracing::info!(
            id = %record.id,
            title = %record.title,
            by = %session.display_name(),
            "service created"
        );
        Ok(record)
    }

    pub fn post_update(
        &self,
        session: &Session,
        service_id: &str,
        text: &str,
        now: NaiveDateTime,
    ) -> AppResult<ServiceRecord> {
        session.require_admin()?;
        let text = text.trim();
        require_fields(&[("text", text)])?;
        let record = self.services.get_required(service_id)?;
        let title = record.title.clone();
        let record = append_update(record, text, session.display_name(), now);
        self.services.upsert(&title, record.clone())?;
        tracing::info!(id = %service_id, by = %session.display_name(), "service update posted");
        Ok(record)
    }

    pub fn change_status(
        &self,
        session: &Session,
        service_id: &str,
        status: ServiceStatus,
    ) -> AppResult<ServiceRecord> {
        session.require_admin()?;
        let record = self.services.get_required(service_id)?;
        let title = record.title.clone();
        let previous = record.status;
        let record = set_status(record, status);
        self.services.upsert(&title, record.clone())?;
        tracing::info!(id = %service_id, from = %previous, to = %status, "service status changed");
        Ok(record)
    }

    pub fn delete_service(&self, session: &Session, service_id: &str) -> AppResult<ServiceRecord> {
        session.require_admin()?;
        let removed = self.services.remove_by_id(service_id)?;
        tracing::info!(id = %service_id, title = %removed.title, "service deleted");
        Ok(removed)
    }

    pub fn get_service(&self, service_id: &str) -> AppResult<ServiceRecord> {
        self.services.get_required(service_id)
    }

    pub fn list_services(&self, request: &ListServicesRequest) -> Vec<ServiceRecord> {
        catalog::list_services(&self.services.load_all(), request)
    }

    /// Following an already followed record is a no-op.
    pub fn follow(&self, session: &mut Session, service_id: &str) -> AppResult<UserAccount> {
        self.services.get_required(service_id)?;
        self.update_following(session, |user| {
            if !user.follows(service_id) {
                user.seguindo.push(service_id.to_string());
            }
        })
    }

    pub fn unfollow(&self, session: &mut Session, service_id: &str) -> AppResult<UserAccount> {
        self.update_following(session, |user| user.seguindo.retain(|id| id != service_id))
    }

    pub fn notifications(&self, session: &Session) -> Vec<NotificationItem> {
        project_notifications(&session.user().seguindo, &self.services.load_all())
    }

    pub fn list_users(&self, session: &Session) -> AppResult<Vec<UserAccount>> {
        session.require_admin()?;
        Ok(self.users.load_all())
    }

    pub fn edit_user(&self, session: &Session, request: EditUserRequest) -> AppResult<UserAccount> {
        session.require_admin()?;
        self.users.edit(request)
    }

    pub fn migrate(&self) -> AppResult<MigrationReport> {
        self.services.migrate()
    }

    fn update_following<F>(&self, session: &mut Session, apply: F) -> AppResult<UserAccount>
    where
        F: FnOnce(&mut UserAccount),
    {
        let cpf = session.user().cpf.clone();
        let mut user = self
            .users
            .get(&cpf)
            .ok_or_else(|| AppError::NotFound(format!("user '{}' not found", cpf)))?;
        apply(&mut user);
        self.users.replace(&user)?;
        session.refresh(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamps::parse_timestamp;

    fn at(value: &str) -> NaiveDateTime {
        parse_timestamp(value).expect("timestamp")
    }

    fn core_with_users() -> (tempfile::TempDir, AppCore) {
        let dir = tempfile::tempdir().expect("temp data dir");
        let core = AppCore::open(dir.path()).expect("open core");
        core.users()
            .save_all(&[
                UserAccount {
                    cpf: "11144477735".to_string(),
                    username: "Prefeitura".to_string(),
                    email: String::new(),
                    telefone: String::new(),
                    cep: "01310100".to_string(),
                    bairro: "Centro".to_string(),
                    senha: "admin".to_string(),
                    is_admin: true,
                    seguindo: Vec::new(),
                },
                UserAccount {
                    cpf: "52998224725".to_string(),
                    username: "Ana".to_string(),
                    email: String::new(),
                    telefone: String::new(),
                    cep: "01310100".to_string(),
                    bairro: "Centro".to_string(),
                    senha: "cidada".to_string(),
                    is_admin: false,
                    seguindo: Vec::new(),
                },
            ])
            .expect("seed users");
        (dir, core)
    }

    fn pothole() -> CreateServiceRequest {
        CreateServiceRequest {
            title: "Buraco X".to_string(),
            description: "Buraco enorme na pista".to_string(),
            address: "Rua Augusta".to_string(),
            number: "100".to_string(),
            bairro: "Consolação".to_string(),
            service_type: "Pavimentação".to_string(),
            cep: Some("01305-000".to_string()),
            image: None,
        }
    }

    #[test]
    fn created_service_defaults_to_pending() {
        let (_dir, core) = core_with_users();
        let citizen = core.login("52998224725", "cidada").expect("login");
        let record = core
            .create_service(&citizen, pothole(), at("10/02/2024 14:30"))
            .expect("create");

        assert_eq!(record.status, ServiceStatus::Pending);
        assert_eq!(record.date, "10/02/2024");
        assert_eq!(record.last_update, "10/02/2024 00:00");
        assert_eq!(record.address, "Rua Augusta, 100, Consolação");
        assert_eq!(record.image, core.settings().default_image);
        assert!(crate::ids::is_well_formed(&record.id));
        assert_eq!(core.services().load_all()["Buraco X"], record);
    }

    #[test]
    fn title_and_cep_type_collisions_are_rejected() {
        let (_dir, core) = core_with_users();
        let citizen = core.login("52998224725", "cidada").expect("login");
        core.create_service(&citizen, pothole(), at("10/02/2024 14:30"))
            .expect("create");

        let same_title = core
            .create_service(&citizen, pothole(), at("11/02/2024 14:30"))
            .expect_err("title collision");
        assert!(same_title.to_string().contains("CONFLICT"));

        let mut same_spot = pothole();
        same_spot.title = "Outro buraco".to_string();
        let duplicate = core
            .create_service(&citizen, same_spot, at("11/02/2024 14:30"))
            .expect_err("duplicate report");
        assert!(duplicate.to_string().contains("CONFLICT"));

        let mut padded_type = pothole();
        padded_type.title = "Mais um buraco".to_string();
        padded_type.service_type = "  Pavimentação ".to_string();
        let duplicate = core
            .create_service(&citizen, padded_type, at("11/02/2024 15:00"))
            .expect_err("padded type is still a duplicate");
        assert!(duplicate.to_string().contains("CONFLICT"));
    }

    #[test]
    fn admin_only_operations_reject_citizens() {
        let (_dir, core) = core_with_users();
        let citizen = core.login("52998224725", "cidada").expect("login");
        let record = core
            .create_service(&citizen, pothole(), at("10/02/2024 14:30"))
            .expect("create");

        for error in [
            core.post_update(&citizen, &record.id, "oi", at("10/02/2024 15:00")).map(|_| ()),
            core.change_status(&citizen, &record.id, ServiceStatus::Resolved).map(|_| ()),
            core.delete_service(&citizen, &record.id).map(|_| ()),
            core.list_users(&citizen).map(|_| ()),
        ] {
            assert!(error.expect_err("citizen denied").to_string().contains("POLICY_DENIED"));
        }
    }

    #[test]
    fn follow_is_idempotent_and_persisted() {
        let (_dir, core) = core_with_users();
        let mut citizen = core.login("52998224725", "cidada").expect("login");
        let record = core
            .create_service(&citizen, pothole(), at("10/02/2024 14:30"))
            .expect("create");

        core.follow(&mut citizen, &record.id).expect("follow");
        core.follow(&mut citizen, &record.id).expect("follow again");
        assert_eq!(citizen.user().seguindo, vec![record.id.clone()]);
        assert_eq!(
            core.users().get("52998224725").expect("stored user").seguindo,
            vec![record.id.clone()]
        );

        core.unfollow(&mut citizen, &record.id).expect("unfollow");
        assert!(citizen.user().seguindo.is_empty());

        let missing = core.follow(&mut citizen, "000ZZZ").expect_err("unknown service");
        assert!(missing.to_string().contains("NOT_FOUND"));
    }

    #[test]
    fn wrong_password_is_denied() {
        let (_dir, core) = core_with_users();
        let error = core.login("52998224725", "nope").expect_err("bad login");
        assert!(error.to_string().contains("POLICY_DENIED"));
    }
}
