use clap::{Parser, Subcommand};
use navmenu::config::{self, MenuConfiguration, MenuSettings};
use navmenu::menu::MenuFacade;
use navmenu::output;
use navmenu::render::TreeRenderer;
use navmenu::side_channel::{SideChannelStore, Variables};
use navmenu::static_tree::StaticPageTree;
use navmenu::types::PageId;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Flags shared by commands that read a page file.
#[derive(clap::Args, Clone)]
struct PageArgs {
    /// JSON page file
    #[arg(long)]
    pages: PathBuf,

    /// Page to render for (defaults to the file's `current`)
    #[arg(long)]
    current: Option<PageId>,
}

#[derive(Parser)]
#[command(name = "navmenu")]
#[command(about = "Render hierarchical navigation menus from a page tree")]
#[command(long_about = "\
Render hierarchical navigation menus from a page tree

Menus expand along the path to the current page: the top level is always
shown, and a page's children appear only when the page is on the active
path (or expand_all is set), up to the configured number of levels.

Page file (JSON):

  {
    \"current\": 21,
    \"base_url\": \"https://example.org\",
    \"pages\": [
      { \"id\": 1,  \"pid\": 0,  \"title\": \"Home\", \"slug\": \"/\" },
      { \"id\": 12, \"pid\": 1,  \"title\": \"Docs\", \"slug\": \"/docs/\" },
      { \"id\": 21, \"pid\": 12, \"title\": \"Install\", \"nav_title\": \"Installing\" }
    ]
  }

Log verbosity follows RUST_LOG (default: warn).

Run 'navmenu gen-config' to generate a documented menu.toml.")]
#[command(version)]
struct Cli {
    /// Menu configuration file (stock defaults when missing)
    #[arg(long, default_value = "menu.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a menu as markup
    Render {
        #[command(flatten)]
        pages: PageArgs,

        /// Start the menu at this page instead of the root line
        #[arg(long)]
        page_uid: Option<PageId>,

        /// Number of levels to render
        #[arg(long)]
        levels: Option<i64>,

        /// Expand every branch, not only the active path
        #[arg(long)]
        expand_all: bool,

        /// Print an indexed item list instead of markup
        #[arg(long)]
        outline: bool,
    },
    /// Render the root line of the current page as a breadcrumb
    Breadcrumb {
        #[command(flatten)]
        pages: PageArgs,
    },
    /// Validate the menu configuration without rendering
    Check,
    /// Print a stock menu.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            pages,
            page_uid,
            levels,
            expand_all,
            outline,
        } => {
            let mut settings = config::load_settings(&cli.config)?;
            if page_uid.is_some() {
                settings.page_uid = page_uid;
            }
            if let Some(levels) = levels {
                settings.levels = levels;
            }
            settings.expand_all |= expand_all;
            let menu_config = settings.resolve()?;
            let tree = load_tree(&pages)?;

            let store = SideChannelStore::new();
            let variables = Variables::new();
            let facade = MenuFacade::new(&tree, &store, &variables);
            if outline {
                let (items, _) = facade.menu_items(&menu_config)?;
                let entries = TreeRenderer::new(&tree, &menu_config).outline(&items)?;
                output::print_outline(&entries);
            } else {
                println!("{}", facade.render(&menu_config)?);
            }
        }
        Command::Breadcrumb { pages } => {
            let menu_config = config::load_settings(&cli.config)?.resolve()?;
            let tree = load_tree(&pages)?;
            let store = SideChannelStore::new();
            let variables = Variables::new();
            let facade = MenuFacade::new(&tree, &store, &variables);
            println!(
                "{}",
                facade.render_breadcrumb(&menu_config, |_| Ok(String::new()))?
            );
        }
        Command::Check => {
            let menu_config = check_config(&cli.config)?;
            let source = cli.config.exists().then_some(cli.config.as_path());
            output::print_check(&menu_config, source);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so rendered markup on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_tree(args: &PageArgs) -> Result<StaticPageTree, Box<dyn std::error::Error>> {
    let mut tree = StaticPageTree::load(&args.pages)?;
    if let Some(current) = args.current {
        tree = tree.with_current(current);
    }
    debug!(pages = tree.len(), path = %args.pages.display(), "loaded page tree");
    Ok(tree)
}

fn check_config(path: &Path) -> Result<MenuConfiguration, config::ConfigError> {
    let settings: MenuSettings = config::load_settings(path)?;
    settings.resolve()
}
