//! Wiring of every service from configuration.

use std::sync::Arc;

use tracing::info;

use cubby_cache::DiskUsageCache;
use cubby_core::config::AppConfig;
use cubby_core::traits::{Mailer, OwnerRoots, SearchIndexer, SizeScanner};
use cubby_database::MetadataStores;
use cubby_storage::PathResolver;
use cubby_storage::tools::{Extractor, FindScanner, RecentScanner, ToolRunner};

use crate::entry::EntryBuilder;
use crate::favorite::FavoriteService;
use crate::file::FileService;
use crate::group_folder::GroupFolderService;
use crate::hooks::{ChangeHook, ReindexQueue};
use crate::notification::LogMailer;
use crate::resource::ResourceTranslator;
use crate::search::{NoopIndexer, RecollIndexer};
use crate::share::ShareService;

/// Collaborators that sit outside the core and can be swapped.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Recursive size measurement.
    pub scanner: Arc<dyn SizeScanner>,
    /// Full-text indexer.
    pub indexer: Arc<dyn SearchIndexer>,
    /// Share notifications.
    pub mailer: Arc<dyn Mailer>,
}

/// Every service, built once and shared.
#[derive(Debug, Clone)]
pub struct CoreState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Metadata stores.
    pub stores: MetadataStores,
    /// Owner root resolution.
    pub resolver: Arc<PathResolver>,
    /// Disk usage cache.
    pub usage: Arc<DiskUsageCache>,
    /// Search indexer.
    pub indexer: Arc<dyn SearchIndexer>,
    /// Post-mutation hook.
    pub hook: Arc<ChangeHook>,
    /// Virtual path translation.
    pub translator: Arc<ResourceTranslator>,
    /// Entry views.
    pub entries: Arc<EntryBuilder>,
    /// Mutation engine.
    pub files: Arc<FileService>,
    /// Shares.
    pub shares: Arc<ShareService>,
    /// Group folders.
    pub group_folders: Arc<GroupFolderService>,
    /// Favorites.
    pub favorites: Arc<FavoriteService>,
}

impl CoreState {
    /// Build the production graph: `find`/`df` sizing, recoll when search
    /// is enabled, and the logging mailer.
    ///
    /// Must run inside a Tokio runtime when search is enabled, since the
    /// reindex queue worker is spawned here.
    pub fn build(config: AppConfig, stores: MetadataStores) -> Self {
        let resolver = Arc::new(PathResolver::from_config(&config.storage));
        let runner = ToolRunner::from_config(&config.tools);

        let indexer: Arc<dyn SearchIndexer> = if config.search.enabled {
            Arc::new(RecollIndexer::new(
                runner.clone(),
                &config.tools,
                &config.search,
                Arc::clone(&resolver),
                Arc::clone(&stores.group_folders),
            ))
        } else {
            Arc::new(NoopIndexer)
        };
        let collaborators = Collaborators {
            scanner: Arc::new(FindScanner::new(runner, &config.tools)),
            indexer,
            mailer: Arc::new(LogMailer::new()),
        };
        Self::assemble(config, stores, resolver, collaborators)
    }

    /// Build the graph around explicit collaborators.
    pub fn assemble(
        config: AppConfig,
        stores: MetadataStores,
        resolver: Arc<PathResolver>,
        collaborators: Collaborators,
    ) -> Self {
        let runner = ToolRunner::from_config(&config.tools);
        let roots: Arc<dyn OwnerRoots> = resolver.clone();
        let usage = Arc::new(DiskUsageCache::new(collaborators.scanner, roots));

        let reindex = config.search.enabled.then(|| {
            let (queue, _worker) =
                ReindexQueue::spawn(Arc::clone(&collaborators.indexer), &config.hooks);
            queue
        });
        let hook = Arc::new(ChangeHook::new(Arc::clone(&usage), reindex));

        let translator = Arc::new(ResourceTranslator::new(
            Arc::clone(&stores.shares),
            Arc::clone(&stores.group_folders),
        ));
        let entries = Arc::new(EntryBuilder::new(
            Arc::clone(&resolver),
            Arc::clone(&usage),
            Arc::clone(&stores.shares),
            Arc::clone(&stores.favorites),
            Arc::clone(&stores.group_folders),
        ));
        let files = Arc::new(FileService::new(
            Arc::clone(&resolver),
            Arc::clone(&entries),
            Arc::clone(&hook),
            Extractor::new(runner.clone(), &config.tools),
            RecentScanner::new(runner, &config.tools),
        ));
        let shares = Arc::new(ShareService::new(
            Arc::clone(&stores.shares),
            Arc::clone(&stores.users),
            collaborators.mailer,
        ));
        let group_folders = Arc::new(GroupFolderService::new(
            Arc::clone(&stores.group_folders),
            Arc::clone(&resolver),
            Arc::clone(&usage),
        ));
        let favorites = Arc::new(FavoriteService::new(Arc::clone(&stores.favorites)));

        info!(
            users_root = %config.storage.users_root.display(),
            groups_root = %config.storage.groups_root.display(),
            search = config.search.enabled,
            "Core services initialized"
        );

        Self {
            config: Arc::new(config),
            stores,
            resolver,
            usage,
            indexer: collaborators.indexer,
            hook,
            translator,
            entries,
            files,
            shares,
            group_folders,
            favorites,
        }
    }
}
