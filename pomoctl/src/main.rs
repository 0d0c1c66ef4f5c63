use anyhow::Result;
use clap::{Parser, Subcommand};
use pomo_ipc::{send_command, Command, Response};

#[derive(Parser)]
#[command(name = "pomoctl")]
#[command(about = "Control a running pomo session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the countdown
    Start,
    /// Stop the countdown, keeping the remaining time
    Stop,
    /// Rewind to the focus duration (or the break duration with --break)
    Reset {
        #[arg(long = "break")]
        to_break: bool,
    },
    /// Show timer status
    Status,
    /// Add a todo
    Add { title: String },
    /// List all todos
    Todos,
    /// Toggle a todo done/undone
    Toggle { id: u32 },
    /// Remove a todo
    Remove { id: u32 },
    /// Ask the app to check for updates
    Update,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Convert CLI command to IPC command
    let command = match cli.command {
        Commands::Start => Command::Start,
        Commands::Stop => Command::Stop,
        Commands::Reset { to_break } => Command::Reset { to_break },
        Commands::Status => Command::Status,
        Commands::Add { title } => Command::AddTodo { title },
        Commands::Todos => Command::ListTodos,
        Commands::Toggle { id } => Command::ToggleTodo { id },
        Commands::Remove { id } => Command::RemoveTodo { id },
        Commands::Update => Command::CheckUpdates,
    };

    // Send command and print the reply
    let response = send_command(&command).await?;
    match response {
        Response::Ok => println!("OK"),
        Response::Status(status) => {
            println!("State: {:?}", status.state);
            println!("Remaining: {}s of {}s", status.remaining, status.total);
        }
        Response::Todos(todos) => {
            for todo in todos {
                let check = if todo.done { "✓" } else { " " };
                println!("[{}] {}: {}", check, todo.id, todo.title);
            }
        }
        Response::Error(e) => eprintln!("Error: {}", e),
    }

    Ok(())
}
