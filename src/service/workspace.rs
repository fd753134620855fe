//! The administrator's tabbed content workspace.
//!
//! One manager per table, sharing nothing but the backend. A tab loads its
//! rows when it is opened.

use super::{ContentStore, ResourceManager, SingletonManager};
use crate::backend::AccessToken;
use crate::domain::{
    ContactInfo, FormFields, FuelPrice, JobListing, NewsItem, RecordId, Resource, ResourceDraft,
    Service, SiteSettings, TeamMember,
};
use crate::error::SiteError;

/// Tabs of the admin workspace, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceTab {
    /// News posts.
    News,
    /// Service offerings.
    Services,
    /// Team members.
    Team,
    /// Job listings.
    Jobs,
    /// Fuel prices.
    FuelPrices,
    /// Contact info singleton.
    Contact,
    /// Site settings singleton.
    Settings,
}

impl WorkspaceTab {
    /// All tabs in display order.
    pub const ALL: [Self; 7] = [
        Self::News,
        Self::Services,
        Self::Team,
        Self::Jobs,
        Self::FuelPrices,
        Self::Contact,
        Self::Settings,
    ];

    /// URL segment of the tab.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Services => "services",
            Self::Team => "team",
            Self::Jobs => "jobs",
            Self::FuelPrices => "fuel-prices",
            Self::Contact => "contact",
            Self::Settings => "settings",
        }
    }

    /// Tab caption.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::News => "News",
            Self::Services => "Services",
            Self::Team => "Team",
            Self::Jobs => "Jobs",
            Self::FuelPrices => "Fuel Prices",
            Self::Contact => "Contact",
            Self::Settings => "Settings",
        }
    }

    /// Parses a URL segment.
    #[must_use]
    pub fn parse(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }
}

/// A user action on one workspace tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    /// Open an empty create form.
    New,
    /// Open the form pre-filled from a row.
    Edit(RecordId),
    /// Close the form.
    Cancel,
    /// Submit the form.
    Save(FormFields),
    /// Replace the form contents without submitting.
    Fill(FormFields),
    /// Arm the delete confirmation for a row.
    RequestDelete(RecordId),
    /// Confirm the armed delete.
    ConfirmDelete(RecordId),
    /// Disarm the delete confirmation.
    CancelDelete,
    /// Commit an inline edit of one field.
    Inline {
        /// Row being edited.
        id: RecordId,
        /// Column name.
        field: String,
        /// New value as typed.
        value: String,
    },
}

async fn perform_list<R: Resource>(
    manager: &mut ResourceManager<R>,
    auth: Option<&AccessToken>,
    action: AdminAction,
) -> Result<(), SiteError> {
    match action {
        AdminAction::New => manager.begin_create(),
        AdminAction::Edit(id) => {
            if !manager.begin_edit(id) {
                return Err(SiteError::NotFound(format!("{} {id}", R::TABLE)));
            }
        }
        AdminAction::Cancel => manager.cancel_edit(),
        AdminAction::Save(form) => {
            manager
                .submit(auth, <R::Draft as ResourceDraft<R>>::from_form(&form))
                .await;
        }
        AdminAction::Fill(form) => {
            manager.set_draft(<R::Draft as ResourceDraft<R>>::from_form(&form));
        }
        AdminAction::RequestDelete(id) => manager.request_delete(id),
        AdminAction::ConfirmDelete(id) => {
            let _ = manager.confirm_delete(auth, id).await;
        }
        AdminAction::CancelDelete => manager.cancel_delete(),
        AdminAction::Inline { id, field, value } => {
            let _ = manager.commit_inline(auth, id, &field, &value).await;
        }
    }
    Ok(())
}

async fn perform_singleton<R: Resource>(
    manager: &mut SingletonManager<R>,
    auth: Option<&AccessToken>,
    action: AdminAction,
) -> Result<(), SiteError> {
    match action {
        AdminAction::Save(form) => {
            let _ = manager
                .submit(auth, <R::Draft as ResourceDraft<R>>::from_form(&form))
                .await;
            Ok(())
        }
        AdminAction::Fill(form) => {
            manager.set_draft(<R::Draft as ResourceDraft<R>>::from_form(&form));
            Ok(())
        }
        AdminAction::Cancel => {
            manager.load(auth).await;
            Ok(())
        }
        other => Err(SiteError::validation(format!(
            "{} does not support {other:?}",
            R::LABEL
        ))),
    }
}

/// Every manager of the admin workspace.
#[derive(Debug)]
pub struct AdminWorkspace {
    active: WorkspaceTab,
    /// News tab.
    pub news: ResourceManager<NewsItem>,
    /// Services tab.
    pub services: ResourceManager<Service>,
    /// Team tab.
    pub team: ResourceManager<TeamMember>,
    /// Jobs tab.
    pub jobs: ResourceManager<JobListing>,
    /// Fuel prices tab.
    pub fuel_prices: ResourceManager<FuelPrice>,
    /// Contact tab.
    pub contact: SingletonManager<ContactInfo>,
    /// Settings tab.
    pub settings: SingletonManager<SiteSettings>,
}

impl AdminWorkspace {
    /// Builds an unloaded workspace with the news tab active.
    #[must_use]
    pub fn new(store: &ContentStore) -> Self {
        Self {
            active: WorkspaceTab::News,
            news: ResourceManager::new(store.table()),
            services: ResourceManager::new(store.table()),
            team: ResourceManager::new(store.table()),
            jobs: ResourceManager::new(store.table()),
            fuel_prices: ResourceManager::new(store.table()),
            contact: SingletonManager::new(store.table()),
            settings: SingletonManager::new(store.table()),
        }
    }

    /// The tab currently shown.
    #[must_use]
    pub const fn active(&self) -> WorkspaceTab {
        self.active
    }

    /// Switches to `tab` and loads its content.
    pub async fn open(&mut self, tab: WorkspaceTab, auth: Option<&AccessToken>) {
        self.active = tab;
        match tab {
            WorkspaceTab::News => self.news.refresh(auth).await,
            WorkspaceTab::Services => self.services.refresh(auth).await,
            WorkspaceTab::Team => self.team.refresh(auth).await,
            WorkspaceTab::Jobs => self.jobs.refresh(auth).await,
            WorkspaceTab::FuelPrices => self.fuel_prices.refresh(auth).await,
            WorkspaceTab::Contact => self.contact.load(auth).await,
            WorkspaceTab::Settings => self.settings.load(auth).await,
        }
    }

    /// Applies `action` to the manager of `tab` and makes it the active
    /// tab.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::NotFound`] when editing a row that is not
    /// listed, and [`SiteError::Validation`] for actions a singleton tab
    /// does not support. Backend failures are reported through the
    /// manager's notice, not as errors.
    pub async fn perform(
        &mut self,
        tab: WorkspaceTab,
        auth: Option<&AccessToken>,
        action: AdminAction,
    ) -> Result<(), SiteError> {
        self.active = tab;
        match tab {
            WorkspaceTab::News => perform_list(&mut self.news, auth, action).await,
            WorkspaceTab::Services => perform_list(&mut self.services, auth, action).await,
            WorkspaceTab::Team => perform_list(&mut self.team, auth, action).await,
            WorkspaceTab::Jobs => perform_list(&mut self.jobs, auth, action).await,
            WorkspaceTab::FuelPrices => perform_list(&mut self.fuel_prices, auth, action).await,
            WorkspaceTab::Contact => perform_singleton(&mut self.contact, auth, action).await,
            WorkspaceTab::Settings => perform_singleton(&mut self.settings, auth, action).await,
        }
    }
}
