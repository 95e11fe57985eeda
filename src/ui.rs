// UI layer: the interactive form built with `dialoguer`. It only collects
// inputs and prints the strings returned by the `follows` functions; none
// of the checking logic lives here.

use crate::api::ApiClient;
use crate::browser::ChromeLauncher;
use crate::follows::{check_follows, check_follows_scraped, parse_unfollow_list, unfollow_users};
use crate::scrape::ScrapeSettings;
use anyhow::Result;
use crossterm::style::{style, Stylize};
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Everything the form's actions need, built once at startup.
pub struct App {
    pub api: ApiClient,
    pub launcher: ChromeLauncher,
    pub scrape: ScrapeSettings,
}

/// Main interactive menu. Runs a select loop until the user chooses
/// "Exit". The token is asked for once and kept for the rest of the run.
pub fn main_menu(app: &App) -> Result<()> {
    let mut token: Option<String> = None;
    loop {
        let items = vec!["Check (API)", "Check (browser)", "Unfollow", "Exit"];
        let selection = Select::new()
            .with_prompt("GitHub Follow Checker")
            .items(&items)
            .default(0)
            .interact()?;
        match selection {
            0 => {
                let account = prompt_account()?;
                let pat = ensure_token(&mut token)?;
                let text = with_spinner("Checking followers...", || {
                    check_follows(&app.api, &account, &pat)
                })?;
                print_result(&text);
            }
            1 => {
                let account = prompt_account()?;
                let text = with_spinner("Scraping profile pages...", || {
                    check_follows_scraped(&app.launcher, &app.scrape, &account)
                })?;
                print_result(&text);
            }
            2 => {
                let pat = ensure_token(&mut token)?;
                let list: String = Input::new()
                    .with_prompt("Usernames to unfollow (comma-separated)")
                    .allow_empty(true)
                    .interact_text()?;
                let count = parse_unfollow_list(&list).len();
                if count > 0
                    && !Confirm::new()
                        .with_prompt(format!("Unfollow {} account(s)?", count))
                        .default(false)
                        .interact()?
                {
                    continue;
                }
                let text =
                    with_spinner("Unfollowing...", || unfollow_users(&app.api, &pat, &list))?;
                print_result(&text);
            }
            3 => break,
            _ => {}
        }
    }
    Ok(())
}

fn prompt_account() -> Result<String> {
    let account: String = Input::new()
        .with_prompt("GitHub username")
        .allow_empty(true)
        .interact_text()?;
    Ok(account)
}

/// Prompt for the personal access token with hidden input.
pub fn prompt_token() -> Result<String> {
    let token = Password::new()
        .with_prompt("Personal Access Token (PAT)")
        .allow_empty_password(true)
        .interact()?;
    Ok(token)
}

/// Reuse the token entered earlier in this run, or ask for one. A blank
/// answer is not remembered so the next action asks again.
fn ensure_token(cached: &mut Option<String>) -> Result<String> {
    if let Some(t) = cached {
        return Ok(t.clone());
    }
    let token = prompt_token()?;
    if !token.trim().is_empty() {
        *cached = Some(token.clone());
    }
    Ok(token)
}

/// Run `f` with a spinner on screen, clearing it afterwards.
pub fn with_spinner<T>(message: &'static str, f: impl FnOnce() -> T) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    Ok(out)
}

/// Print a result panel; error text is shown in red.
pub fn print_result(text: &str) {
    if text.starts_with("Error:") {
        println!("{}", style(text).red());
    } else {
        println!("{}", text);
    }
}
