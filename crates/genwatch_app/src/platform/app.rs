use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use genwatch_client::{
    ClientSettings, LogNotifier, ReqwestJobApi, SessionContext, SessionHandle, WsTransport,
};
use genwatch_core::AppViewModel;
use genwatch_logging::{genwatch_info, genwatch_warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use super::commands::{self, Command, HELP};
use super::logging::{self, LogDestination};
use super::render::render;

const USER_VAR: &str = "GENWATCH_USER_ID";

pub async fn run_app() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();
    logging::initialize(LogDestination::from_env());

    let settings = ClientSettings::from_env().context("invalid genwatch configuration")?;
    genwatch_info!("API base {}", settings.api_base_url);
    let api = Arc::new(ReqwestJobApi::new(&settings).context("could not build http client")?);
    let mut context = SessionContext::new(
        settings,
        api,
        Arc::new(WsTransport),
        Arc::new(LogNotifier),
    );

    match std::env::var(USER_VAR) {
        Ok(user_id) if !user_id.trim().is_empty() => {
            context.set_user(Some(user_id.trim().to_string())).await?;
        }
        _ => println!("not signed in; use `login <user>` or set {USER_VAR}"),
    }
    println!("{HELP}");

    let mut views = context.session().map(SessionHandle::subscribe);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                let command = match commands::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => command,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                let relogged = matches!(command, Command::Login(_) | Command::Logout);
                if let Err(err) = execute(&mut context, command).await {
                    genwatch_warn!("Command failed: {:#}", err);
                    println!("error: {err:#}");
                }
                if relogged {
                    views = context.session().map(SessionHandle::subscribe);
                }
            }
            Some(view) = next_view(&mut views) => print_view(&view),
        }
    }

    context.teardown().await;
    Ok(())
}

async fn execute(context: &mut SessionContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login(user_id) => return Ok(context.set_user(Some(user_id)).await?),
        Command::Logout => {
            context.set_user(None).await?;
            println!("signed out");
            return Ok(());
        }
        Command::Help => {
            println!("{HELP}");
            return Ok(());
        }
        _ => {}
    }

    let Some(session) = context.session() else {
        anyhow::bail!("not signed in");
    };
    match command {
        Command::Submit => session.generation_started(),
        Command::Like(publication_id) => session.toggle_like(publication_id),
        Command::Follow(user_id) => session.toggle_follow(user_id),
        Command::Scroll(offset) => session.scrolled(offset),
        Command::Publish(job_id) => session.publish(job_id),
        Command::Watch(job_id) => session.watch_job(job_id),
        Command::History { page, limit } => {
            let jobs = session.history(page, limit).await?;
            if jobs.is_empty() {
                println!("no generations on page {page}");
            }
            for job in jobs {
                let published = if job.is_published { " published" } else { "" };
                println!(
                    "{} [{}]{} {}",
                    job.id,
                    job.status,
                    published,
                    job.prompt.as_deref().unwrap_or("")
                );
            }
        }
        Command::Show => print_view(&session.view()),
        Command::Login(_) | Command::Logout | Command::Help | Command::Quit => {}
    }
    Ok(())
}

async fn next_view(views: &mut Option<watch::Receiver<AppViewModel>>) -> Option<AppViewModel> {
    let Some(receiver) = views else {
        return std::future::pending().await;
    };
    if receiver.changed().await.is_err() {
        *views = None;
        return None;
    }
    Some(receiver.borrow_and_update().clone())
}

fn print_view(view: &AppViewModel) {
    let stamp = Local::now().format("%H:%M:%S");
    for line in render(view) {
        println!("[{stamp}] {line}");
    }
}
