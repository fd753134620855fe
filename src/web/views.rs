//! Template view models.
//!
//! Handlers never hand domain types to templates directly when something
//! has to be derived first (formatted dates, initials, form field state).
//! Admin panels are built generically from [`FieldSpec`] metadata and the
//! serialized draft, so one template renders every tab.

use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    FieldKind, FieldSpec, FuelPrice, JobListing, NewsItem, RecordId, Resource, ResourceDraft,
    Service, SiteSettings, TeamMember,
};
use crate::service::{
    AdminWorkspace, Notice, ResourceManager, SingletonManager, UploadCategory, WorkspaceTab,
};

const DISPLAY_DATE: &str = "%B %-d, %Y";

/// Company name and logo shown in the header and footer.
#[derive(Debug, Clone, Serialize)]
pub struct Branding {
    /// Company name.
    pub company_name: String,
    /// Logo URL, when one has been uploaded.
    pub logo_url: Option<String>,
}

impl From<SiteSettings> for Branding {
    fn from(settings: SiteSettings) -> Self {
        Self {
            company_name: settings.company_name,
            logo_url: settings.logo_url.filter(|u| !u.trim().is_empty()),
        }
    }
}

/// Context of every page: branding, the highlighted nav entry and the
/// page-specific body.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Header and footer branding.
    pub brand: Branding,
    /// Nav entry to highlight.
    pub nav: &'static str,
    /// Copyright year.
    pub year: i32,
    /// Page-specific data.
    pub body: T,
}

impl<T: Serialize> Page<T> {
    /// Wraps `body` with the shared chrome.
    pub fn new(brand: Branding, nav: &'static str, body: T) -> Self {
        Self {
            brand,
            nav,
            year: Utc::now().year(),
            body,
        }
    }
}

// ── Public pages ────────────────────────────────────────────────────────

/// A news post as listed on the home page.
#[derive(Debug, Serialize)]
pub struct NewsCard {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Formatted publication date.
    pub published: String,
}

impl From<NewsItem> for NewsCard {
    fn from(item: NewsItem) -> Self {
        Self {
            published: item.published_date.format(DISPLAY_DATE).to_string(),
            title: item.title,
            content: item.content,
        }
    }
}

/// Home page body.
#[derive(Debug, Serialize)]
pub struct HomeView {
    /// Fuel prices, fuel type ascending.
    pub prices: Vec<FuelPrice>,
    /// Latest effective date among `prices`.
    pub last_updated: Option<String>,
    /// Latest published news.
    pub news: Vec<NewsCard>,
}

impl HomeView {
    /// Number of news posts shown on the home page.
    pub const NEWS_LIMIT: usize = 3;

    /// Builds the body from the fetched rows.
    #[must_use]
    pub fn new(prices: Vec<FuelPrice>, news: Vec<NewsItem>) -> Self {
        let last_updated = prices
            .iter()
            .map(|p| p.effective_date)
            .max()
            .map(|d| d.format(DISPLAY_DATE).to_string());
        Self {
            prices,
            last_updated,
            news: news
                .into_iter()
                .take(Self::NEWS_LIMIT)
                .map(NewsCard::from)
                .collect(),
        }
    }
}

/// A team member card.
#[derive(Debug, Serialize)]
pub struct TeamCard {
    /// Full name.
    pub name: String,
    /// Job title.
    pub role: String,
    /// Biography.
    pub bio: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Initials for the placeholder avatar.
    pub initials: String,
}

impl From<TeamMember> for TeamCard {
    fn from(member: TeamMember) -> Self {
        Self {
            initials: member.initials(),
            name: member.name,
            role: member.role,
            bio: member.bio,
            avatar_url: member.avatar_url.filter(|u| !u.trim().is_empty()),
        }
    }
}

/// An open position.
#[derive(Debug, Serialize)]
pub struct JobCard {
    /// Job title.
    pub title: String,
    /// Department.
    pub department: String,
    /// Location.
    pub location: String,
    /// Description.
    pub description: String,
    /// Requirement bullets.
    pub requirements: Vec<String>,
}

impl From<JobListing> for JobCard {
    fn from(job: JobListing) -> Self {
        Self {
            requirements: job
                .requirement_lines()
                .into_iter()
                .map(str::to_string)
                .collect(),
            title: job.title,
            department: job.department,
            location: job.location,
            description: job.description,
        }
    }
}

/// About page body.
#[derive(Debug, Serialize)]
pub struct AboutView {
    /// Active team members.
    pub team: Vec<TeamCard>,
    /// Active job listings.
    pub jobs: Vec<JobCard>,
}

/// A backend service with its detail lines split out.
#[derive(Debug, Serialize)]
pub struct ServiceCard {
    /// Service name.
    pub title: String,
    /// Description.
    pub description: String,
    /// Icon name.
    pub icon: Option<String>,
    /// Detail bullets.
    pub details: Vec<String>,
}

impl From<Service> for ServiceCard {
    fn from(service: Service) -> Self {
        Self {
            details: service
                .details
                .as_deref()
                .unwrap_or_default()
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            title: service.title,
            description: service.description,
            icon: service.icon,
        }
    }
}

// ── Admin panels ────────────────────────────────────────────────────────

/// One input of a generated form.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    /// Input name.
    pub name: &'static str,
    /// Label.
    pub label: &'static str,
    /// Widget kind.
    pub kind: FieldKind,
    /// Whether the input is required.
    pub required: bool,
    /// Current value as text.
    pub value: String,
    /// Checkbox state.
    pub checked: bool,
}

fn field_views(specs: &[FieldSpec], source: &Value) -> Vec<FieldView> {
    specs
        .iter()
        .map(|spec| {
            let current = source.get(spec.name);
            let (value, checked) = match current {
                Some(Value::String(s)) => (s.clone(), false),
                Some(Value::Bool(b)) => (String::new(), *b),
                Some(Value::Number(n)) => (n.to_string(), false),
                _ => (String::new(), false),
            };
            FieldView {
                name: spec.name,
                label: spec.label,
                kind: spec.kind,
                required: spec.required,
                value,
                checked,
            }
        })
        .collect()
}

/// One listed row of an admin panel.
#[derive(Debug, Serialize)]
pub struct RowView {
    /// Row id.
    pub id: RecordId,
    /// Heading.
    pub title: String,
    /// Secondary line.
    pub subtitle: String,
    /// Whether the row is visible on the public site.
    pub public: bool,
    /// Whether this row's delete confirmation is armed.
    pub pending_delete: bool,
    /// Fields editable in place.
    pub inline: Vec<FieldView>,
}

/// A tab link.
#[derive(Debug, Serialize)]
pub struct TabView {
    /// URL segment.
    pub slug: &'static str,
    /// Caption.
    pub label: &'static str,
    /// Whether this is the shown tab.
    pub active: bool,
}

/// Everything the portal template needs to render one admin tab.
#[derive(Debug, Serialize)]
pub struct PanelView {
    /// URL segment of the tab.
    pub tab: &'static str,
    /// Resource label.
    pub label: &'static str,
    /// Singleton tabs have no list and no create.
    pub singleton: bool,
    /// For singletons: whether the row was loaded (submit is disabled
    /// otherwise).
    pub loaded: bool,
    /// Whether the form is shown.
    pub form_open: bool,
    /// Row being edited, if any.
    pub editing: Option<RecordId>,
    /// Form inputs.
    pub fields: Vec<FieldView>,
    /// Listed rows.
    pub rows: Vec<RowView>,
    /// Outcome of the last action, shown once.
    pub notice: Option<Notice>,
    /// Field an upload fills, when the tab accepts uploads.
    pub upload_field: Option<&'static str>,
}

/// Upload category accepted by `tab`, if any.
#[must_use]
pub const fn upload_category(tab: WorkspaceTab) -> Option<UploadCategory> {
    match tab {
        WorkspaceTab::Team => Some(UploadCategory::Avatar),
        WorkspaceTab::Settings => Some(UploadCategory::Logo),
        _ => None,
    }
}

impl PanelView {
    /// Builds a list panel, taking the manager's pending notice.
    pub fn list<R: Resource>(tab: WorkspaceTab, manager: &mut ResourceManager<R>) -> Self {
        let draft = serde_json::to_value(manager.draft()).unwrap_or(Value::Null);
        let pending = manager.pending_delete();
        let rows = manager
            .rows()
            .iter()
            .map(|row| {
                let (title, subtitle) = row.summary();
                let values = serde_json::to_value(row).unwrap_or(Value::Null);
                RowView {
                    id: row.id(),
                    title,
                    subtitle,
                    public: row.is_public(),
                    pending_delete: pending == Some(row.id()),
                    inline: field_views(R::INLINE_FIELDS, &values),
                }
            })
            .collect();
        Self {
            tab: tab.slug(),
            label: R::LABEL,
            singleton: false,
            loaded: true,
            form_open: manager.form_open(),
            editing: manager.editing(),
            fields: field_views(<R::Draft as ResourceDraft<R>>::FIELDS, &draft),
            rows,
            notice: manager.take_notice(),
            upload_field: upload_category(tab).map(UploadCategory::target_field),
        }
    }

    /// Builds a singleton panel, taking the manager's pending notice.
    pub fn singleton<R: Resource>(tab: WorkspaceTab, manager: &mut SingletonManager<R>) -> Self {
        let draft = serde_json::to_value(manager.draft()).unwrap_or(Value::Null);
        Self {
            tab: tab.slug(),
            label: R::LABEL,
            singleton: true,
            loaded: manager.record().is_some(),
            form_open: true,
            editing: manager.record().map(R::id),
            fields: field_views(<R::Draft as ResourceDraft<R>>::FIELDS, &draft),
            rows: Vec::new(),
            notice: manager.take_notice(),
            upload_field: upload_category(tab).map(UploadCategory::target_field),
        }
    }

    /// Builds the panel of the workspace's active tab.
    pub fn active(workspace: &mut AdminWorkspace) -> Self {
        let tab = workspace.active();
        match tab {
            WorkspaceTab::News => Self::list(tab, &mut workspace.news),
            WorkspaceTab::Services => Self::list(tab, &mut workspace.services),
            WorkspaceTab::Team => Self::list(tab, &mut workspace.team),
            WorkspaceTab::Jobs => Self::list(tab, &mut workspace.jobs),
            WorkspaceTab::FuelPrices => Self::list(tab, &mut workspace.fuel_prices),
            WorkspaceTab::Contact => Self::singleton(tab, &mut workspace.contact),
            WorkspaceTab::Settings => Self::singleton(tab, &mut workspace.settings),
        }
    }
}

/// Tab strip with `active` highlighted.
#[must_use]
pub fn tabs(active: WorkspaceTab) -> Vec<TabView> {
    WorkspaceTab::ALL
        .into_iter()
        .map(|tab| TabView {
            slug: tab.slug(),
            label: tab.label(),
            active: tab == active,
        })
        .collect()
}

/// What the portal shows, by auth state.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortalView {
    /// Sign-in or sign-up form.
    SignIn {
        /// Show the sign-up variant.
        sign_up: bool,
    },
    /// Regular user's dashboard.
    Dashboard {
        /// Signed-in address.
        email: String,
    },
    /// Administrator's workspace.
    Admin {
        /// Signed-in address.
        email: String,
        /// Tab strip.
        tabs: Vec<TabView>,
        /// Active tab.
        panel: PanelView,
    },
}

/// Portal page body.
#[derive(Debug, Serialize)]
pub struct PortalBody {
    /// Auth notice held for this render.
    pub flash: Option<Notice>,
    /// State-dependent content.
    pub view: PortalView,
}
