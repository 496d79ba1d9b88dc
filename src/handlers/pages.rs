use crate::dispatcher::{Reply, RequestContext};
use crate::error::HttpError;
use crate::middleware::FlashKind;
use crate::router::RouteMatch;
use crate::views::ViewContext;

/// Template shared by the plain content pages.
pub const PAGE_TEMPLATE: &str = "index";

fn page(title: &str, content: &str) -> Reply {
    Reply::render(
        PAGE_TEMPLATE,
        ViewContext::new()
            .with("title", title)
            .with("content", content),
    )
}

pub fn home(_: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
    Ok(page(
        "Home Page",
        "<h1>Welcome to the Home Page</h1><p>This is the main content.</p>",
    ))
}

pub fn about(_: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
    Ok(page(
        "About Page",
        "<h1>About Us</h1><p>This is the about page content.</p>",
    ))
}

/// Contact details plus the contact form.
pub fn contact(_: &RouteMatch, _: &mut RequestContext) -> Result<Reply, HttpError> {
    Ok(Reply::render(
        "contact",
        ViewContext::new()
            .with("title", "Contact Page")
            .with(
                "content",
                "<h1>Contact Us</h1><ul><li>Storefront Support</li>\
                 <li>555-0100</li><li>support@example.com</li></ul>",
            ),
    ))
}

/// Accepts the contact form and redirects back with a flash message.
pub fn submit_contact(_: &RouteMatch, ctx: &mut RequestContext) -> Result<Reply, HttpError> {
    let name = ctx.body_field("name").map(str::to_owned);
    let has_message = ctx.body_field("message").is_some();
    match name {
        Some(name) if has_message => {
            ctx.flash(
                FlashKind::Success,
                format!("Thanks, {name}! Your message has been received."),
            );
        }
        _ => {
            ctx.flash(FlashKind::Error, "Please provide your name and a message.");
        }
    }
    Ok(Reply::redirect("/contact"))
}
