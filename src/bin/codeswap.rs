use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use codeswap::backend::MemoryBackend;
use codeswap::config::AppConfig;
use codeswap::model::RecordFields;
use codeswap::shortcuts::ShortcutTable;
use codeswap::ui::{App, Screen};

#[derive(Parser, Debug)]
#[clap(name = "codeswap", version, about = "Search and maintain product code changes")]
struct Args {
    /// Supabase project URL
    #[clap(long, env = "SUPABASE_URL")]
    url: Option<String>,

    /// Public anon key of the project
    #[clap(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    anon_key: Option<String>,

    /// Table holding the substitutions
    #[clap(long, env = "CODESWAP_TABLE")]
    table: Option<String>,

    /// JSON file mapping user name shortcuts to sign-in emails
    #[clap(long, env = "CODESWAP_SHORTCUTS")]
    shortcuts: Option<PathBuf>,

    /// Run against built-in sample data instead of a Supabase project
    #[clap(long)]
    demo: bool,
}

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "\
Commands:
  /TEXT        search (a lone / clears the search)
  login        sign in            logout   sign out
  add          new entry          edit N   edit entry N
  delete N     delete entry N     yes/no   answer a confirmation
  fill         fill in the open form again, then save
  save         save the open form cancel   close the open form
  refresh      reload the list    quit     leave";

enum Event {
    Line(Option<String>),
    SessionChanged,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let args = Args::parse();
    let mut app = if args.demo {
        demo_app().await
    } else {
        let mut config = match (&args.url, &args.anon_key) {
            (Some(url), Some(key)) => AppConfig::new(url, key)?,
            _ => AppConfig::from_env()?,
        };
        if let Some(table) = &args.table {
            config.options = config.options.clone().with_table(table);
        }
        if let Some(path) = args.shortcuts {
            config = config.with_shortcuts_path(path);
        }
        codeswap::connect(&config).await?
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);
    render(&mut app);

    loop {
        prompt("> ");
        let event = tokio::select! {
            line = input.next_line() => Event::Line(line?),
            _ = app.session_changed() => Event::SessionChanged,
        };

        match event {
            Event::Line(None) => break,
            Event::Line(Some(line)) => {
                if !handle(&mut app, &mut input, line.trim()).await? {
                    break;
                }
            }
            Event::SessionChanged => {
                app.sync_session();
                println!();
            }
        }
        render(&mut app);
    }

    Ok(())
}

fn render(app: &mut App) {
    println!("\n{}", Screen::build(app));
    app.take_notice();
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

async fn ask(input: &mut Input, question: &str) -> std::io::Result<Option<String>> {
    prompt(question);
    input.next_line().await
}

fn entry_number(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map(|n| n - 1)
}

/// Returns `false` when the user wants to leave
async fn handle(app: &mut App, input: &mut Input, line: &str) -> std::io::Result<bool> {
    if let Some(query) = line.strip_prefix('/') {
        app.set_query(query);
        return Ok(true);
    }

    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_lowercase();
    let arg = words.next();

    match command.as_str() {
        "" => {}
        "quit" | "exit" => return Ok(false),
        "help" => println!("{}", HELP),
        "refresh" => app.refresh().await,
        "logout" => app.sign_out().await,
        "login" => {
            app.open_login();
            let Some(identifier) = ask(input, "User name or email: ").await? else {
                return Ok(false);
            };
            let Some(password) = ask(input, "Password: ").await? else {
                return Ok(false);
            };
            if let Some(form) = app.login_form_mut() {
                form.identifier = identifier;
                form.password = password;
            }
            app.submit_login().await;
        }
        "add" => {
            app.open_editor(None);
            if !fill_and_save(app, input).await? {
                return Ok(false);
            }
        }
        "edit" => match entry_number(arg) {
            Some(index) => {
                app.open_editor(Some(index));
                if !fill_and_save(app, input).await? {
                    return Ok(false);
                }
            }
            None => println!("usage: edit N"),
        },
        "fill" => {
            if !fill_and_save(app, input).await? {
                return Ok(false);
            }
        }
        "save" => app.submit_editor().await,
        "delete" => match entry_number(arg) {
            Some(index) => app.request_delete(index),
            None => println!("usage: delete N"),
        },
        "yes" | "y" => app.confirm_delete().await,
        "no" | "n" => app.cancel_delete(),
        "cancel" => {
            app.close_editor();
            app.close_login();
            app.cancel_delete();
        }
        other => println!("unknown command `{}`, try `help`", other),
    }
    Ok(true)
}

/// Prompt for each field of the open form, then save it.
///
/// An empty answer keeps the current value and `-` clears it.
async fn fill_and_save(app: &mut App, input: &mut Input) -> std::io::Result<bool> {
    let Some(mut draft) = app.editor().draft().cloned() else {
        return Ok(true);
    };

    for (label, value) in [
        ("Product name", &mut draft.product_name),
        ("Old code", &mut draft.old_code),
        ("New code", &mut draft.new_code),
        ("Notes", &mut draft.notes),
    ] {
        let Some(answer) = ask(input, &format!("{} [{}]: ", label, value)).await? else {
            return Ok(false);
        };
        let answer = answer.trim();
        if answer == "-" {
            value.clear();
        } else if !answer.is_empty() {
            *value = answer.to_string();
        }
    }

    if let Some(open) = app.editor_draft_mut() {
        *open = draft;
    }
    app.submit_editor().await;
    Ok(true)
}

async fn demo_app() -> App {
    let sample = [
        ("Banana", "0", "17", None),
        ("Blueberries 125g", "4410", "4420", Some("Punnet size changed")),
        ("Oat milk 1l", "8801", "8815", Some("Supplier switch")),
        ("Sourdough loaf", "2201", "2230", None),
    ];
    let backend = MemoryBackend::new()
        .with_records(sample.iter().map(|(name, old, new, notes)| RecordFields {
            product_name: name.to_string(),
            old_code: old.to_string(),
            new_code: new.to_string(),
            notes: notes.map(str::to_string),
        }))
        .with_account("demo@codeswap.local", "demo");
    let shortcuts: ShortcutTable = [("demo", "demo@codeswap.local")].into_iter().collect();

    println!("Demo mode: sign in as `demo` with password `demo`.");
    App::start(Arc::new(backend), shortcuts).await
}
