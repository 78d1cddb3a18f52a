//! GitHub REST API response shapes.

use quill_renderer::components::{CardPreview, CardStats};
use serde::Deserialize;

/// Subset of `GET /repos/{owner}/{repo}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RepoResponse {
    full_name: Option<String>,
    description: Option<String>,
    stargazers_count: Option<u64>,
    forks_count: Option<u64>,
    language: Option<String>,
    license: Option<License>,
    owner: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct License {
    spdx_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    avatar_url: Option<String>,
}

impl From<RepoResponse> for CardPreview {
    fn from(repo: RepoResponse) -> Self {
        // GitHub reports unrecognized licenses as NOASSERTION
        let license = repo.license.and_then(|license| {
            license
                .spdx_id
                .filter(|id| id != "NOASSERTION")
                .or(license.name)
        });
        Self {
            title: repo.full_name,
            description: repo.description,
            owner_icon: repo.owner.and_then(|owner| owner.avatar_url),
            stats: CardStats {
                stars: repo.stargazers_count,
                forks: repo.forks_count,
                language: repo.language,
                license,
            },
        }
    }
}
