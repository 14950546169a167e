use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::backend::Clients;
use crate::cli::{CandidatesCommand, Command, DashboardArgs, TodosCommand};
use crate::dashboard::{Dashboard, Navigator, Route};
use crate::datastore::LocalBackend;
use crate::model::Candidate;
use crate::prompt::LinePrompt;
use crate::render::Renderer;
use crate::todos::TodoApp;

/// Records navigation requests and renders the page they lead to.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    pub history: Vec<Route>,
}

impl Navigator for TerminalNavigator {
    fn push(&mut self, route: Route) {
        debug!(route = route.path(), "navigating");
        self.history.push(route);
    }
}

#[instrument(skip(backend, renderer))]
pub fn dispatch(
    backend: Arc<LocalBackend>,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let clients = Clients::from_local(backend.clone());
    let stdout = io::stdout();

    match command {
        Command::Login { login_id } => {
            let identity = backend.sign_in(&login_id)?;
            writeln!(stdout.lock(), "Signed in as {}", identity.username)?;
            Ok(())
        }
        Command::Logout => cmd_logout(&clients, renderer, stdout.lock()),
        Command::Whoami => cmd_whoami(&clients, stdout.lock()),
        Command::Home => cmd_home(&clients, renderer, stdout.lock()),
        Command::Dashboard(args) => cmd_dashboard(&clients, renderer, &args, stdout.lock()),
        Command::Todos(TodosCommand::List) => cmd_todos_list(&clients, renderer, stdout.lock()),
        Command::Todos(TodosCommand::Add { content }) => {
            let stdin = io::stdin();
            cmd_todos_add(&clients, content, stdin.lock(), stdout.lock())
        }
        Command::Todos(TodosCommand::Delete { id }) => {
            TodoApp::new(clients.data.clone()).delete(&id)?;
            writeln!(stdout.lock(), "Deleted todo {id}")?;
            Ok(())
        }
        Command::Todos(TodosCommand::Shell) => {
            let stdin = io::stdin();
            run_todo_shell(&clients, renderer, stdin.lock(), stdout.lock())
        }
        Command::Candidates(CandidatesCommand::Import { file }) => {
            cmd_import_candidates(&backend, &file, stdout.lock())
        }
    }
}

#[instrument(skip_all)]
pub fn cmd_home<W: Write>(clients: &Clients, renderer: &Renderer, out: W) -> anyhow::Result<()> {
    if clients.identity()?.is_none() {
        return renderer.print_signed_out(out);
    }
    cmd_dashboard(clients, renderer, &DashboardArgs::default(), out)
}

#[instrument(skip(clients, renderer, out))]
pub fn cmd_dashboard<W: Write>(
    clients: &Clients,
    renderer: &Renderer,
    args: &DashboardArgs,
    out: W,
) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::new();
    dashboard.mount(clients.auth.as_ref(), clients.data.as_ref());

    if let Some(search) = &args.search {
        dashboard.set_search(search.as_str());
    }
    if args.newest_first {
        dashboard.toggle_sort();
    }
    if args.menu {
        dashboard.toggle_menu();
    }
    if let Some(row) = args.select {
        let picked = row
            .checked_sub(1)
            .and_then(|position| dashboard.select_visible(position))
            .is_some();
        if !picked {
            warn!(row, "no candidate at that row");
        }
    }

    renderer.print_dashboard(out, &dashboard)?;
    dashboard.unmount();
    Ok(())
}

#[instrument(skip_all)]
pub fn cmd_logout<W: Write>(clients: &Clients, renderer: &Renderer, out: W) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::new();
    let mut navigator = TerminalNavigator::default();
    dashboard
        .logout(clients.auth.as_ref(), &mut navigator)
        .context("sign out failed")?;

    match navigator.history.last() {
        Some(Route::Root) => cmd_home(clients, renderer, out),
        None => Ok(()),
    }
}

pub fn cmd_whoami<W: Write>(clients: &Clients, mut out: W) -> anyhow::Result<()> {
    match clients.identity()? {
        Some(identity) => {
            writeln!(out, "username  {}", identity.username)?;
            writeln!(out, "login id  {}", identity.login_id().unwrap_or("-"))?;
        }
        None => writeln!(out, "not signed in")?,
    }
    Ok(())
}

#[instrument(skip_all)]
pub fn cmd_todos_list<W: Write>(clients: &Clients, renderer: &Renderer, mut out: W) -> anyhow::Result<()> {
    let Some(identity) = clients.identity()? else {
        return renderer.print_signed_out(out);
    };

    let mut app = TodoApp::new(clients.data.clone());
    app.sync_identity(Some(identity))?;
    app.pump()?;
    renderer.print_todos(&mut out, &app)
}

#[instrument(skip(clients, input, out))]
pub fn cmd_todos_add<R: BufRead, W: Write>(
    clients: &Clients,
    content: Option<String>,
    input: R,
    mut out: W,
) -> anyhow::Result<()> {
    let app = TodoApp::new(clients.data.clone());
    let created = match content {
        Some(content) => Some(app.create(Some(content))?),
        None => app.create_from_prompt(&mut LinePrompt::new(input, &mut out))?,
    };

    match created {
        Some(todo) => writeln!(out, "Created todo {}", todo.id)?,
        None => writeln!(out, "Cancelled")?,
    }
    Ok(())
}

/// Event loop for the todo list. Each input line is one event; pushes are
/// pumped and the list re-rendered after every event.
#[instrument(skip_all)]
pub fn run_todo_shell<R: BufRead, W: Write>(
    clients: &Clients,
    renderer: &Renderer,
    mut input: R,
    mut out: W,
) -> anyhow::Result<()> {
    let mut app = TodoApp::new(clients.data.clone());

    loop {
        if let Err(err) = clients.identity().and_then(|identity| app.sync_identity(identity)) {
            renderer.print_error(&mut out, &err.to_string())?;
        }
        if let Err(err) = app.pump() {
            renderer.print_error(&mut out, &err.to_string())?;
        }

        if app.identity().is_none() {
            renderer.print_signed_out(&mut out)?;
            return Ok(());
        }
        renderer.print_todos(&mut out, &app)?;

        write!(out, "[n]ew  [d]elete N|ID  sign [o]ut  [r]efresh  [q]uit > ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(());
        }

        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or("r");
        let arg = parts.next();
        debug!(verb, arg, "shell event");

        let outcome = match verb {
            "n" | "new" => app
                .create_from_prompt(&mut LinePrompt::new(&mut input, &mut out))
                .map(|_| ()),
            "d" | "delete" => match arg {
                Some(target) => {
                    let id = resolve_todo_target(&app, target);
                    app.delete(&id).map_err(anyhow::Error::from)
                }
                None => Err(anyhow!("delete needs a row number or id")),
            },
            "o" | "signout" => app
                .sign_out(clients.auth.as_ref())
                .map_err(anyhow::Error::from),
            "r" | "refresh" => Ok(()),
            "q" | "quit" => return Ok(()),
            other => Err(anyhow!("unknown command: {other}")),
        };

        if let Err(err) = outcome {
            renderer.print_error(&mut out, &format!("{err:#}"))?;
        }
    }
}

/// Row numbers are 1-based positions in the rendered list; anything else is
/// taken as a raw id.
fn resolve_todo_target(app: &TodoApp, target: &str) -> String {
    target
        .parse::<usize>()
        .ok()
        .and_then(|row| row.checked_sub(1))
        .and_then(|idx| app.items().get(idx))
        .map(|todo| todo.id.clone())
        .unwrap_or_else(|| target.to_string())
}

#[instrument(skip(backend, out))]
pub fn cmd_import_candidates<W: Write>(
    backend: &LocalBackend,
    file: &Path,
    mut out: W,
) -> anyhow::Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let candidates: Vec<Candidate> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let added = backend.import_candidates(candidates)?;
    info!(added, file = %file.display(), "candidate import finished");
    writeln!(out, "Imported {added} candidates")?;
    Ok(())
}
