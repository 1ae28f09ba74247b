//! Line-oriented interactive session over one deck.
//!
//! Each `search` line behaves like a keystroke burst settling: the value goes
//! through the debounced coordinator and the list is printed once the query
//! has propagated.

use super::handlers::{handle_download, handle_list, handle_upload, AppContext};
use super::print::{print_error_notice, print_view};
use reportdeck::error::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const SETTLE_MARGIN: Duration = Duration::from_millis(20);

const HELP: &str = "\
Commands:
  list                       show the report list
  search <text>              filter reports by name
  clear                      clear the search
  upload <file>...           upload PDF or CSV files
  download <name> [dir]      download a report
  dismiss                    dismiss the current error
  help                       show this help
  quit                       leave the session";

pub async fn run_shell(ctx: &mut AppContext) -> Result<()> {
    let mut search = ctx.deck.search();
    let debounce = ctx.deck.config().debounce();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    handle_list(ctx, None)?;

    loop {
        stdout.write_all(b"reportdeck> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let outcome = match command {
            "" => Ok(()),
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                println!("{}", HELP);
                Ok(())
            }
            "list" | "ls" => handle_list(ctx, None),
            "search" | "s" => {
                search.on_value_change(rest);
                tokio::time::sleep(debounce + SETTLE_MARGIN).await;
                handle_list(ctx, None)
            }
            "clear" => {
                search.on_clear();
                handle_list(ctx, None)
            }
            "upload" | "up" => {
                let files: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if files.is_empty() {
                    println!("usage: upload <file>...");
                    Ok(())
                } else {
                    handle_upload(ctx, files).await
                }
            }
            "download" | "dl" => {
                let mut args = rest.split_whitespace();
                match args.next() {
                    Some(name) => {
                        let out = args.next().map(PathBuf::from);
                        handle_download(ctx, name, out)
                    }
                    None => {
                        println!("usage: download <name> [dir]");
                        Ok(())
                    }
                }
            }
            "dismiss" => {
                ctx.deck.dismiss_error();
                print_view(&ctx.deck.view(&mut ctx.memo));
                Ok(())
            }
            other => {
                println!("Unknown command: {} (try `help`)", other);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("Error: {}", e);
        }
        if let Some(error) = ctx.deck.error() {
            print_error_notice(&error);
        }
    }

    Ok(())
}
