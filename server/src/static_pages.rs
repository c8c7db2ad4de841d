use axum::http::{Request, Uri};
use tower::Service;
use tower_http::services::ServeDir;

/// Informational pages served under clean paths; requests are rewritten to
/// the matching html file before `ServeDir` sees them. `/` works without a
/// rewrite because `ServeDir` picks up `index.html` on its own.
const PAGE_ROUTES: &[(&str, &str)] = &[
    ("/about", "/about.html"),
    ("/contact", "/contact.html"),
    ("/privacy", "/privacy.html"),
    ("/terms", "/terms.html"),
];

#[derive(Debug, Clone)]
pub struct StaticPagesService<Fallback> {
    serve_dir: ServeDir<Fallback>,
}

impl<F> StaticPagesService<F> {
    pub fn new(serve_dir: ServeDir<F>) -> Self {
        Self { serve_dir }
    }
}

impl<ReqBody, Fallback> Service<Request<ReqBody>> for StaticPagesService<Fallback>
where
    ServeDir<Fallback>: Service<Request<ReqBody>>,
{
    type Response = <ServeDir<Fallback> as Service<Request<ReqBody>>>::Response;
    type Error = <ServeDir<Fallback> as Service<Request<ReqBody>>>::Error;
    type Future = <ServeDir<Fallback> as Service<Request<ReqBody>>>::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        <ServeDir<Fallback> as Service<Request<ReqBody>>>::poll_ready(&mut self.serve_dir, cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let page_file = PAGE_ROUTES
            .iter()
            .find(|(route, _)| req.uri().path() == *route)
            .map(|(_, file)| *file);
        if let Some(page_file) = page_file {
            let mut b = Uri::builder();
            if let Some(scheme) = req.uri().scheme() {
                b = b.scheme(scheme.clone());
            }
            if let Some(authority) = req.uri().authority() {
                b = b.authority(authority.clone());
            }
            b = b.path_and_query(page_file);
            *req.uri_mut() = b.build().expect("url is copied from request");
        }
        self.serve_dir.call(req)
    }
}
