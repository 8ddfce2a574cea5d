//! The export macro every dynamic plugin invokes once.

/// Exports a [`ServerPlugin`](vidhub_plugin::traits::ServerPlugin) value as
/// the entry points of a plugin library.
///
/// The value is built lazily on first `register` and lives as long as the
/// library does.
///
/// # Example
/// ```rust,ignore
/// vidhub_plugin_sdk::export_plugin!(MyPlugin::default());
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($plugin:expr) => {
        static __VIDHUB_PLUGIN: ::std::sync::LazyLock<
            ::std::sync::Arc<dyn $crate::prelude::ServerPlugin>,
        > = ::std::sync::LazyLock::new(|| ::std::sync::Arc::new($plugin));

        #[unsafe(no_mangle)]
        pub fn vidhub_plugin_abi_version() -> u32 {
            $crate::ABI_VERSION
        }

        #[unsafe(no_mangle)]
        pub fn vidhub_plugin_register(
            helpers: $crate::prelude::RegisterHelpers,
        ) -> $crate::BoxFuture<'static, $crate::anyhow::Result<()>> {
            let plugin = ::std::sync::Arc::clone(&*__VIDHUB_PLUGIN);
            ::std::boxed::Box::pin(async move {
                $crate::prelude::ServerPlugin::register(&*plugin, helpers).await
            })
        }

        #[unsafe(no_mangle)]
        pub fn vidhub_plugin_unregister() -> $crate::BoxFuture<'static, $crate::anyhow::Result<()>> {
            let plugin = ::std::sync::Arc::clone(&*__VIDHUB_PLUGIN);
            ::std::boxed::Box::pin(async move {
                $crate::prelude::ServerPlugin::unregister(&*plugin).await
            })
        }
    };
}
