use std::process;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio::sync::broadcast;

use livefeed::{FeedClient, FeedConfig};
use notibox::api::{HttpGateway, NotificationGateway};
use notibox::cli::{Args, Commands};
use notibox::config::AppConfig;
use notibox::controller::{AutoConfirm, ConfirmPrompt, NotificationCenter};
use notibox::output;
use notibox::prompt::TerminalPrompt;
use notibox::store::NotificationStore;
use notibox::toast::Toast;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("{} {e}", "Error:".red().bold());
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load(args.config.as_deref())?;
    let _log_guard = notibox::logging::init(args.verbose, args.quiet, config.log_dir.as_deref())?;

    let token = args
        .token
        .clone()
        .or_else(|| config.token.clone())
        .unwrap_or_default();

    let gateway: Arc<dyn NotificationGateway> = Arc::new(HttpGateway::new(
        &config.api_url,
        &token,
        config.request_timeout(),
    )?);
    let store = Arc::new(NotificationStore::new(config.page_size));

    let feed_config = FeedConfig {
        reconnect_delay: config.reconnect_delay(),
        ..FeedConfig::new(config.feed_url.clone())
    };
    let (feed, events) = FeedClient::new(feed_config);
    let feed = Arc::new(feed);

    let confirm: Arc<dyn ConfirmPrompt> = match &args.command {
        Commands::Delete { yes: false, .. } | Commands::Clear { yes: false, .. } => {
            Arc::new(TerminalPrompt)
        }
        _ => Arc::new(AutoConfirm),
    };

    let center = NotificationCenter::new(gateway, Arc::clone(&feed), Arc::clone(&store), confirm);
    let mut toasts = store.subscribe_toasts();

    match args.command {
        Commands::Watch => {
            center.load_baseline().await;
            drain_toasts(&mut toasts);
            output::print_view(&store.view());

            center.start_live(&token, events).await;

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    toast = toasts.recv() => match toast {
                        Ok(toast) => output::print_toast(&toast),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }

            center.shutdown().await;
        }

        Commands::List {
            filter,
            search,
            page,
        } => {
            center.load_baseline().await;
            store.set_filter(filter.into());
            if let Some(term) = search {
                store.set_search(term);
            }
            store.set_page(page);
            drain_toasts(&mut toasts);
            output::print_view(&store.view());
        }

        Commands::MarkRead { id } => {
            center.load_baseline().await;
            center.toggle_read(&id).await;
            drain_toasts(&mut toasts);
        }

        Commands::MarkAllRead { filter, search } => {
            center.load_baseline().await;
            store.set_filter(filter.into());
            if let Some(term) = search {
                store.set_search(term);
            }
            center.mark_all_read().await;
            drain_toasts(&mut toasts);
        }

        Commands::Delete { id, .. } => {
            center.load_baseline().await;
            center.delete(&id).await;
            drain_toasts(&mut toasts);
        }

        Commands::Clear { filter, search, .. } => {
            center.load_baseline().await;
            store.set_filter(filter.into());
            if let Some(term) = search {
                store.set_search(term);
            }
            center.clear_all().await;
            drain_toasts(&mut toasts);
        }
    }

    Ok(())
}

fn drain_toasts(toasts: &mut broadcast::Receiver<Toast>) {
    while let Ok(toast) = toasts.try_recv() {
        output::print_toast(&toast);
    }
}
