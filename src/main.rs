use anyhow::{anyhow, Context, Result};
use arruma_minha_cidade::timestamps::now_local;
use arruma_minha_cidade::{
    init_tracing, AppCore, CreateServiceRequest, EditUserRequest, ListServicesRequest,
    RegisterUserRequest, ServiceFilter, ServiceSort, ServiceStatus, Session,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arruma")]
#[command(about = "Arruma Minha Cidade: city service reports", long_about = None)]
struct Cli {
    /// Directory holding services_updates.json, usuarios.json and settings.json
    #[arg(long, env = "ARRUMA_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// CPF of the acting user
    #[arg(long, env = "ARRUMA_CPF", global = true)]
    cpf: Option<String>,

    #[arg(long, env = "ARRUMA_SENHA", global = true, hide_env_values = true)]
    senha: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a citizen account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        telefone: String,
        #[arg(long = "user-cpf")]
        user_cpf: String,
        #[arg(long)]
        cep: String,
        #[arg(long, default_value = "")]
        bairro: String,
        #[arg(long = "password")]
        password: String,
    },
    /// Check credentials and print the account
    Login,
    /// Report a new service request
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        address: String,
        #[arg(long, default_value = "")]
        number: String,
        #[arg(long)]
        bairro: String,
        #[arg(long = "type")]
        service_type: String,
        #[arg(long)]
        cep: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// List services (filter: all, bairro, rua, tipo; sort: created, last-update)
    List {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value = "all")]
        filter: ServiceFilter,
        #[arg(long, default_value = "last-update")]
        sort: ServiceSort,
    },
    Show {
        id: String,
    },
    /// Post an update to a service (admin)
    Update {
        id: String,
        text: String,
    },
    /// Change a service status (admin)
    Status {
        id: String,
        status: ServiceStatus,
    },
    /// Delete a service (admin)
    Delete {
        id: String,
    },
    Follow {
        id: String,
    },
    Unfollow {
        id: String,
    },
    /// Updates on followed services, newest first
    Notifications,
    /// List accounts (admin)
    Users,
    /// Edit an account's username or bairro (admin)
    EditUser {
        #[arg(long = "user-cpf")]
        user_cpf: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        bairro: Option<String>,
    },
    /// Rewrite the services document in its current shape
    Migrate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let core = AppCore::open(&cli.data_dir)
        .with_context(|| format!("opening data dir {}", cli.data_dir.display()))?;
    init_tracing(core.data_dir(), &core.settings().log_level)?;

    match cli.command {
        Commands::Register {
            username,
            email,
            telefone,
            user_cpf,
            cep,
            bairro,
            password,
        } => print_json(&core.register(RegisterUserRequest {
            username,
            email,
            telefone,
            cpf: user_cpf,
            cep,
            bairro,
            senha: password,
        })?),
        Commands::Login => {
            let session = login(&core, &cli.cpf, &cli.senha)?;
            print_json(session.user())
        }
        Commands::Create {
            title,
            description,
            address,
            number,
            bairro,
            service_type,
            cep,
            image,
        } => {
            let session = login(&core, &cli.cpf, &cli.senha)?;
            let request = CreateServiceRequest {
                title,
                description,
                address,
                number,
                bairro,
                service_type,
                cep,
                image,
            };
            print_json(&core.create_service(&session, request, now_local())?)
        }
        Commands::List {
            query,
            filter,
            sort,
        } => print_json(&core.list_services(&ListServicesRequest {
            query,
            filter,
            sort,
        })),
        Commands::Show { id } => print_json(&core.get_service(&id)?),
        Commands::Update { id, text } => {
            let session = login(&core, &cli.cpf, &cli.senha)?;
            print_json(&core.post_update(&session, &id, &text, now_local())?)
        }
        Commands::Status { id, status } => {
            let session = login(&core, &cli.cpf, &cli.senha)?;
            print_json(&core.change_status(&session, &id, status)?)
        }
        Commands::Delete { id } => {
            let session = login(&core, &cli.cpf, &cli.senha)?;
            print_json(&core.delete_service(&session, &id)?)
        }
        Commands::Follow { id } => {
            let mut session = login(&core, &cli.cpf, &cli.senha)?;
            print_json(&core.follow(&mut session, &id)?)
        }
        Commands::Unfollow { id } => {
            let mut session = login(&core, &cli.cpf, &cli.senha)?;
            print_json(&core.unfollow(&mut session, &id)?)
        }
        Commands::Notifications => {
            let session = login(&core, &cli.cpf, &cli.senha)?;
            print_json(&core.notifications(&session))
        }
        Commands::Users => {
            let session = login(&core, &cli.cpf, &cli.senha)?;
            print_json(&core.list_users(&session)?)
        }
        Commands::EditUser {
            user_cpf,
            username,
            bairro,
        } => {
            let session = login(&core, &cli.cpf, &cli.senha)?;
            let request = EditUserRequest {
                cpf: user_cpf,
                username,
                bairro,
            };
            print_json(&core.edit_user(&session, request)?)
        }
        Commands::Migrate => print_json(&core.migrate()?),
    }
}

fn login(core: &AppCore, cpf: &Option<String>, senha: &Option<String>) -> Result<Session> {
    let (Some(cpf), Some(senha)) = (cpf, senha) else {
        return Err(anyhow!("this command needs --cpf and --senha (or ARRUMA_CPF / ARRUMA_SENHA)"));
    };
    Ok(core.login(cpf, senha)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
