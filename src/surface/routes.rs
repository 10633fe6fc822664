use crate::auth::session::Role;
use crate::notification::model::ArticleRef;

/// Navigation target for a selected notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ReviewArticle(String),
    NewsDetail(String),
    Home,
}

impl Route {
    /// Role-to-destination mapping table. Admins and managers land on the
    /// review view for the article, writers on the public detail view, and
    /// everyone else (or nobody) on the portal root.
    pub fn for_notification(role: Option<Role>, article: &ArticleRef) -> Self {
        match role {
            Some(Role::Admin) | Some(Role::Manager) => {
                Route::ReviewArticle(article.slug.clone())
            }
            Some(Role::Writer) => Route::NewsDetail(article.slug.clone()),
            Some(Role::Reader) | None => Route::Home,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::ReviewArticle(slug) => format!("/review/article/{}", slug),
            Route::NewsDetail(slug) => format!("/news/{}", slug),
            Route::Home => "/".to_string(),
        }
    }
}

/// UI collaborator that performs the actual navigation. The surface never
/// waits on it; selection navigates immediately.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}
