//! Replaces the bodies of error responses with rendered pages.

use crate::middleware::ClientCtx;
use actix_web::dev::ServiceResponse;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpMessage, HttpResponse, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "403.html")]
struct ForbiddenTemplate {
    client: ClientCtx,
}

#[derive(Template)]
#[template(path = "404.html")]
struct NotFoundTemplate {
    client: ClientCtx,
}

#[derive(Template)]
#[template(path = "500.html")]
struct InternalErrorTemplate {
    client: ClientCtx,
}

fn render<B, T, F>(res: ServiceResponse<B>, build: F) -> Result<ErrorHandlerResponse<B>>
where
    T: Template,
    F: FnOnce(ClientCtx) -> T,
{
    let (req, res) = res.into_parts();
    let client = ClientCtx::get_or_default_from_extensions(&mut req.extensions_mut());

    let body = match build(client).render() {
        Ok(body) => body,
        Err(e) => {
            log::error!("error page failed to render: {}", e);
            return Ok(ErrorHandlerResponse::Response(
                ServiceResponse::new(req, res).map_into_left_body(),
            ));
        }
    };

    let res = HttpResponse::build(res.status())
        .content_type("text/html; charset=utf-8")
        .body(body);

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, res).map_into_right_body(),
    ))
}

pub fn render_403<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(res, |client| ForbiddenTemplate { client })
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(res, |client| NotFoundTemplate { client })
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(res, |client| InternalErrorTemplate { client })
}
