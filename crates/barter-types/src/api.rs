use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forms::AdForm;
use crate::models::{Ad, Category, Condition, ExchangeProposal, ProposalStatus};

// -- JWT Claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Flash --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// Body of every redirect: where to go next and what to tell the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
    pub location: String,
}

// -- Ads --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdView {
    #[serde(flatten)]
    pub ad: Ad,
    pub category_display: String,
    pub condition_display: String,
}

impl From<Ad> for AdView {
    fn from(ad: Ad) -> Self {
        Self {
            category_display: ad.category.label().to_string(),
            condition_display: ad.condition.label().to_string(),
            ad,
        }
    }
}

/// Raw listing query. Everything stays a string so a bad value never
/// rejects the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub page: Option<String>,
}

/// Filters that were actually applied to a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
}

impl ListingQuery {
    pub fn filters(&self) -> ListingFilters {
        fn non_empty(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }

        ListingFilters {
            search: non_empty(&self.search).map(str::to_string),
            category: non_empty(&self.category).and_then(Category::parse),
            condition: non_empty(&self.condition).and_then(Condition::parse),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdListPage {
    pub ads: Vec<AdView>,
    pub page: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub filters: ListingFilters,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdDetailPage {
    pub ad: AdView,
    pub is_author: bool,
    /// Filled for the author only.
    pub received_proposals: Vec<ProposalView>,
    /// The viewer's own ads that can be offered; empty for the author.
    pub offerable_ads: Vec<AdView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceView {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdFormPage {
    pub categories: Vec<ChoiceView>,
    pub conditions: Vec<ChoiceView>,
    pub values: Option<AdForm>,
}

impl AdFormPage {
    pub fn new(values: Option<AdForm>) -> Self {
        Self {
            categories: Category::ALL
                .iter()
                .map(|c| ChoiceView {
                    code: c.code().to_string(),
                    label: c.label().to_string(),
                })
                .collect(),
            conditions: Condition::ALL
                .iter()
                .map(|c| ChoiceView {
                    code: c.code().to_string(),
                    label: c.label().to_string(),
                })
                .collect(),
            values,
        }
    }
}

impl From<&Ad> for AdForm {
    fn from(ad: &Ad) -> Self {
        Self {
            title: ad.title.clone(),
            description: ad.description.clone(),
            image_url: ad.image_url.clone(),
            category: ad.category.code().to_string(),
            condition: ad.condition.code().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdDeletePage {
    pub ad: AdView,
    pub proposals_to_remove: u64,
}

// -- Proposals --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalView {
    #[serde(flatten)]
    pub proposal: ExchangeProposal,
    pub status_display: String,
}

impl From<ExchangeProposal> for ProposalView {
    fn from(proposal: ExchangeProposal) -> Self {
        Self {
            status_display: proposal.status.label().to_string(),
            proposal,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalListPage {
    pub sent: Vec<ProposalView>,
    pub received: Vec<ProposalView>,
    pub status: Option<ProposalStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalDetailPage {
    pub proposal: ProposalView,
    pub can_respond: bool,
    pub can_delete: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}
