pub mod demo;
pub mod drop;
pub mod init;
pub mod schema;

use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Save the configuration and create the demo tables")]
    Init(init::InitArgs),
    #[command(about = "Print the compiled CREATE statements")]
    Schema(schema::SchemaArgs),
    #[command(about = "Walk through saving, loading, updating and deleting demo entities")]
    Demo(demo::DemoArgs),
    #[command(about = "Drop demo tables")]
    Drop(drop::DropArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> anyhow::Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Schema(args) => schema::cmd(args),
            Commands::Demo(args) => demo::cmd(args),
            Commands::Drop(args) => drop::cmd(args),
        }
    }
}
