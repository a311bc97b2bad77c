use crate::domain::{BlogPost, Profile};
use crate::gateway::service::DEFAULT_LATEST;
use crate::gateway::Gateway;

#[derive(Debug, Clone, PartialEq)]
pub struct HomeView {
    pub profile: Option<Profile>,
    pub latest: Vec<BlogPost>,
}

/// Profile and latest posts, fetched together. Either may come back empty.
pub async fn load_home(gateway: &Gateway) -> HomeView {
    let (profile, latest) = futures::join!(gateway.profile(), gateway.latest_posts(DEFAULT_LATEST));
    HomeView { profile, latest }
}
