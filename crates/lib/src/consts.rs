/// Length of the truncated object hash used to identify manifests.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Sector size used when converting partition offsets for partitioning tools.
pub const SECTOR_SIZE: u64 = 512;

/// Default output filename of a raw disk image pipeline.
pub const DEFAULT_IMAGE_FILENAME: &str = "disk.img";

/// Name of the pipeline producing the disk image.
pub const IMAGE_PIPELINE_NAME: &str = "image";

/// Name of the build root pipeline.
pub const BUILD_PIPELINE_NAME: &str = "build";

/// Runner used by build roots deployed from a container.
pub const CONTAINER_BUILD_RUNNER: &str = "org.osbuild.linux";

/// Directory inside the image where OpenSCAP remediation results are stored.
pub const HARDENING_RESULTS_DIR: &str = "/opt/hardening-results";

/// Subpath never relabeled by SELinux labeling of a deployed tree.
pub const SELINUX_EXCLUDED_ROOT: &str = "/sysroot";

/// Manifest format version understood by the executor.
pub const MANIFEST_VERSION: &str = "2";
