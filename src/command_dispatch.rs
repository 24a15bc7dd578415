//! Purpose: Hold top-level CLI command dispatch for `etcd-rest`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: The client is only built for commands that talk to etcd.
//! Invariants: Absent entities and unhealthy members print a result and exit non-zero.

use super::*;
use etcd_rest::api::{
    CreateMember, CreateUserOptions, DeleteCondition, Key, KeyOptions, Permissions, Role,
    SwapCondition, WaitOptions,
};

pub(super) fn dispatch_command(
    command: Command,
    connection: &ConnectionArgs,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => Ok(completion(shell)),
        Command::Get { key } => key_result(connection.client()?.keys().get_key(&key)?),
        Command::Set { key, value, ttl } => key_result(
            connection
                .client()?
                .keys()
                .create_key_with_options(&key, &value, &key_options(ttl))?,
        ),
        Command::Push { key, value, ttl } => key_result(
            connection
                .client()?
                .keys()
                .create_in_order_key_with_options(&key, &value, &key_options(ttl))?,
        ),
        Command::Ordered { key } => {
            key_result(connection.client()?.keys().list_in_order_key(&key)?)
        }
        Command::Rm { key } => key_result(connection.client()?.keys().delete_key(&key)?),
        Command::Watch {
            key,
            wait_index,
            recursive,
        } => {
            let mut options = WaitOptions::new();
            if let Some(index) = wait_index {
                options = options.with_wait_index(index);
            }
            if recursive {
                options = options.recursive();
            }
            key_result(
                connection
                    .client()?
                    .keys()
                    .wait_key_with_options(&key, &options)?,
            )
        }
        Command::Cas {
            key,
            value,
            prev_value,
            prev_index,
            prev_exist,
        } => {
            let condition = match (prev_value, prev_index, prev_exist) {
                (Some(prev), None, None) => SwapCondition::PrevValue(prev),
                (None, Some(index), None) => SwapCondition::PrevIndex(index),
                (None, None, Some(exists)) => SwapCondition::PrevExist(exists),
                _ => return Err(one_precondition_error("cas")),
            };
            key_result(
                connection
                    .client()?
                    .keys()
                    .compare_and_swap_key(&key, &condition, &value)?,
            )
        }
        Command::Cad {
            key,
            prev_value,
            prev_index,
        } => {
            let condition = match (prev_value, prev_index) {
                (Some(prev), None) => DeleteCondition::PrevValue(prev),
                (None, Some(index)) => DeleteCondition::PrevIndex(index),
                _ => return Err(one_precondition_error("cad")),
            };
            key_result(
                connection
                    .client()?
                    .keys()
                    .compare_and_delete_key(&key, &condition)?,
            )
        }
        Command::Mkdir { dir, ttl } => key_result(
            connection
                .client()?
                .keys()
                .create_dir_with_options(&dir, &key_options(ttl))?,
        ),
        Command::Ls { dir, recursive } => {
            key_result(connection.client()?.keys().list_dir(&dir, recursive)?)
        }
        Command::Rmdir { dir } => key_result(connection.client()?.keys().delete_dir(&dir)?),
        Command::Auth { command } => {
            let client = connection.client()?;
            let state = match command {
                AuthCommand::Status => client.auth().is_enabled()?,
                AuthCommand::Enable => client.auth().enable()?,
                AuthCommand::Disable => client.auth().disable()?,
            };
            emit_result(
                &state,
                state.error_message.as_ref(),
                ErrorKind::PreconditionFailed,
            )
        }
        Command::Role { command } => dispatch_role(command, connection),
        Command::User { command } => dispatch_user(command, connection),
        Command::Member { command } => dispatch_member(command, connection),
        Command::Stats { command } => {
            let client = connection.client()?;
            let value = match command {
                StatsCommand::Leader => to_json(&client.stats().leader()?)?,
                StatsCommand::SelfStats => to_json(&client.stats().self_stats()?)?,
                StatsCommand::Store => to_json(&client.stats().store()?)?,
            };
            emit_json(&value);
            Ok(RunOutcome::ok())
        }
        Command::Health => {
            let healthy = connection.client()?.misc().health()?;
            emit_json(&json!({ "health": healthy }));
            Ok(if healthy {
                RunOutcome::ok()
            } else {
                RunOutcome::with_code(to_exit_code(ErrorKind::Unavailable))
            })
        }
        Command::Version => {
            let version = connection.client()?.misc().version()?;
            emit_json(&json!({
                "client": env!("CARGO_PKG_VERSION"),
                "etcdserver": version.etcdserver,
                "etcdcluster": version.etcdcluster,
            }));
            Ok(RunOutcome::ok())
        }
    }
}

fn dispatch_role(command: RoleCommand, connection: &ConnectionArgs) -> Result<RunOutcome, Error> {
    let client = connection.client()?;
    match command {
        RoleCommand::List => {
            emit_json(&to_json(&client.roles().list()?)?);
            Ok(RunOutcome::ok())
        }
        RoleCommand::Get { name } => match client.roles().get(&name)? {
            Some(role) => emit_result(&role, None, ErrorKind::NotFound),
            None => Err(Error::new(ErrorKind::NotFound)
                .with_message("role not found")
                .with_key(name)
                .with_hint("List roles with `etcd-rest role list`.")),
        },
        RoleCommand::Create {
            name,
            read,
            write,
            grant_read,
            grant_write,
            revoke_read,
            revoke_write,
        } => {
            let mut role = Role::new(name);
            if !read.is_empty() || !write.is_empty() {
                role = role.with_permissions(Permissions::kv(read, write));
            }
            if !grant_read.is_empty() || !grant_write.is_empty() {
                role = role.with_grant(Permissions::kv(grant_read, grant_write));
            }
            if !revoke_read.is_empty() || !revoke_write.is_empty() {
                role = role.with_revoke(Permissions::kv(revoke_read, revoke_write));
            }
            let role = client.roles().create(&role)?;
            emit_result(&role, role.error_message.as_ref(), ErrorKind::AlreadyExists)
        }
        RoleCommand::Delete { name } => deleted_result(client.roles().delete(&name)?),
    }
}

fn dispatch_user(command: UserCommand, connection: &ConnectionArgs) -> Result<RunOutcome, Error> {
    let client = connection.client()?;
    match command {
        UserCommand::List => {
            emit_json(&to_json(&client.users().list()?)?);
            Ok(RunOutcome::ok())
        }
        UserCommand::Get { name } => match client.users().get(&name)? {
            Some(user) => emit_result(&user, None, ErrorKind::NotFound),
            None => Err(Error::new(ErrorKind::NotFound)
                .with_message("user not found")
                .with_key(name)
                .with_hint("List users with `etcd-rest user list`.")),
        },
        UserCommand::Create {
            name,
            password,
            roles,
            grant,
            revoke,
        } => {
            let options = CreateUserOptions::new(name, password)
                .with_roles(roles)
                .with_grant(grant)
                .with_revoke(revoke);
            let user = client.users().create(&options)?;
            emit_result(&user, user.error_message.as_ref(), ErrorKind::AlreadyExists)
        }
        UserCommand::Delete { name } => deleted_result(client.users().delete(&name)?),
    }
}

fn dispatch_member(
    command: MemberCommand,
    connection: &ConnectionArgs,
) -> Result<RunOutcome, Error> {
    let client = connection.client()?;
    match command {
        MemberCommand::List => {
            emit_json(&to_json(&client.members().list()?)?);
            Ok(RunOutcome::ok())
        }
        MemberCommand::Add {
            peer_urls,
            name,
            client_urls,
        } => {
            let mut member = CreateMember::new(peer_urls).with_client_urls(client_urls);
            if let Some(name) = name {
                member = member.with_name(name);
            }
            let member = client.members().add(&member)?;
            emit_result(&member, member.error_message.as_ref(), ErrorKind::Usage)
        }
        MemberCommand::Remove { id } => deleted_result(client.members().delete(&id)?),
    }
}

fn key_options(ttl: Option<u64>) -> KeyOptions {
    match ttl {
        Some(secs) => KeyOptions::new().with_ttl(Duration::from_secs(secs)),
        None => KeyOptions::new(),
    }
}

fn key_result(key: Key) -> Result<RunOutcome, Error> {
    emit_result(&key, key.error_message.as_ref(), ErrorKind::Internal)
}

fn deleted_result(deleted: bool) -> Result<RunOutcome, Error> {
    emit_json(&json!({ "deleted": deleted }));
    Ok(if deleted {
        RunOutcome::ok()
    } else {
        RunOutcome::with_code(to_exit_code(ErrorKind::NotFound))
    })
}

fn one_precondition_error(command: &str) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message("exactly one precondition is required")
        .with_hint(format!("Try `etcd-rest {command} --help`."))
}
