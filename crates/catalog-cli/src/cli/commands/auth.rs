//! Auth command handlers.

use anyhow::{Result, bail};
use catalog_core::api::mask_token;

use super::{print_notice, prompt, prompt_line};
use crate::cli::AppContext;

pub async fn login(
    ctx: &AppContext,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    if let Some(user) = ctx.session.current_user() {
        println!(
            "Already logged in as {}; logging in again replaces the session.",
            user.display_name(&user.username)
        );
    }

    let mut view = ctx.login_view();
    view.username = match username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    view.password = match password {
        Some(password) => password,
        None => prompt_line("Password: ")?,
    };

    let Some(result) = view.submit().await else {
        // blank field, rejected before any request
        let message = view.take_notice().map(|n| n.text).unwrap_or_default();
        bail!("{message}");
    };
    if !result.success {
        bail!("{}", result.message);
    }

    print_notice(view.take_notice());
    println!("  Session saved to: {}", ctx.storage_path.display());
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    if !ctx.session.is_authenticated() {
        println!("Not logged in (no session found).");
        return Ok(());
    }

    let mut view = ctx.catalog_view();
    view.logout();
    print_notice(view.take_notice());
    println!("  Session removed from: {}", ctx.storage_path.display());
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    let Some(user) = ctx.session.current_user() else {
        println!("Not logged in.");
        return Ok(());
    };

    println!("{}", user.display_name(&user.username));
    if !user.username.is_empty() {
        println!("  Username: {}", user.username);
    }
    if let Some(id) = user.id {
        println!("  ID:       {id}");
    }
    if let Some(email) = &user.email {
        println!("  Email:    {email}");
    }
    if let Some(role) = &user.role {
        println!("  Role:     {role}");
    }
    let token = ctx
        .session
        .token()
        .map_or_else(|| "none".to_string(), |t| mask_token(&t));
    println!("  Token:    {token}");
    Ok(())
}
