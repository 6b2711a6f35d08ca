pub mod k8s {
    pub mod deployment {
        /// `kind` stamped on a finished Deployment.
        pub const KIND: &str = "Deployment";

        /// `apiVersion` stamped on a finished Deployment.
        pub const API_VERSION: &str = "apps/v1";

        /// Fallback for a non-positive `revisionHistoryLimit`.
        pub const DEFAULT_REVISION_HISTORY_LIMIT: i32 = 10;

        /// Fallback for a negative `progressDeadlineSeconds`.
        pub const DEFAULT_PROGRESS_DEADLINE_SECONDS: i32 = 600;

        /// Floor applied to `minReadySeconds`.
        pub const MIN_READY_SECONDS_FLOOR: i32 = 0;
    }

    pub mod container {
        /// Probes and volume mounts always target this slot.
        pub const PRIMARY_INDEX: usize = 0;

        /// A container port must satisfy `MIN_PORT < port < MAX_PORT`.
        pub const MIN_PORT: i32 = 0;
        pub const MAX_PORT: i32 = 65536;
    }
}
