//! Package installer used by the store: pacman first, yay (AUR) as fallback.
//!
//! Package names go straight into argv; no shell is involved.

use std::process::ExitStatus;

use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("invalid package name: {0:?}")]
    InvalidName(String),
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{package} was not installed (last exit status: {status})")]
    Failed { package: String, status: ExitStatus },
}

/// One package manager invocation: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStep {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub package: String,
    /// Program of the step that succeeded (`sudo` for pacman, `yay`).
    pub installed_by: String,
}

#[derive(Clone)]
pub struct PackageInstaller {
    steps: fn(&str) -> Vec<InstallStep>,
}

impl Default for PackageInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageInstaller {
    pub fn new() -> Self {
        Self { steps: pacman_then_yay }
    }

    /// Installer with a custom plan (tests, other distributions).
    pub fn with_steps(steps: fn(&str) -> Vec<InstallStep>) -> Self {
        Self { steps }
    }

    pub fn plan(&self, package: &str) -> Result<Vec<InstallStep>, InstallError> {
        if !is_valid_package_name(package) {
            return Err(InstallError::InvalidName(package.to_string()));
        }
        Ok((self.steps)(package))
    }

    /// Run each step until one exits successfully. Waits for completion.
    pub async fn install(&self, package: &str) -> Result<InstallOutcome, InstallError> {
        let mut last_status = None;
        for step in self.plan(package)? {
            tracing::info!("Installing {} with: {} {}", package, step.program, step.args.join(" "));
            let status = Command::new(&step.program)
                .args(&step.args)
                .status()
                .await
                .map_err(|source| InstallError::Spawn {
                    program: step.program.clone(),
                    source,
                })?;
            if status.success() {
                return Ok(InstallOutcome {
                    package: package.to_string(),
                    installed_by: step.program,
                });
            }
            tracing::warn!("{} exited with {} for {}", step.program, status, package);
            last_status = Some(status);
        }
        match last_status {
            Some(status) => Err(InstallError::Failed {
                package: package.to_string(),
                status,
            }),
            None => Err(InstallError::InvalidName(package.to_string())),
        }
    }
}

fn pacman_then_yay(package: &str) -> Vec<InstallStep> {
    let common = ["-S", "--needed", "--noconfirm"];
    let mut pacman_args = vec!["pacman".to_string()];
    pacman_args.extend(common.iter().map(|s| s.to_string()));
    pacman_args.push(package.to_string());

    let mut yay_args: Vec<String> = common.iter().map(|s| s.to_string()).collect();
    yay_args.push(package.to_string());

    vec![
        InstallStep {
            program: "sudo".to_string(),
            args: pacman_args,
        },
        InstallStep {
            program: "yay".to_string(),
            args: yay_args,
        },
    ]
}

/// Arch package names: lowercase alphanumerics and `@._+-`, not starting with `-` or `.`.
pub fn is_valid_package_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(['-', '.'])
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "@._+-".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_is_pacman_then_yay() {
        let plan = PackageInstaller::new().plan("obs-studio").unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].program, "sudo");
        assert_eq!(plan[0].args, vec!["pacman", "-S", "--needed", "--noconfirm", "obs-studio"]);
        assert_eq!(plan[1].program, "yay");
        assert_eq!(plan[1].args, vec!["-S", "--needed", "--noconfirm", "obs-studio"]);
    }

    #[test]
    fn option_like_or_shell_names_are_rejected() {
        for bad in ["", "--help", ".hidden", "vlc; rm -rf /", "VLC", "a b"] {
            assert!(
                matches!(PackageInstaller::new().plan(bad), Err(InstallError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn falls_back_to_the_next_step() {
        fn plan(_: &str) -> Vec<InstallStep> {
            vec![
                InstallStep { program: "false".into(), args: vec![] },
                InstallStep { program: "true".into(), args: vec![] },
            ]
        }
        let outcome = PackageInstaller::with_steps(plan).install("vlc").await.unwrap();
        assert_eq!(outcome.installed_by, "true");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reports_last_failure() {
        fn plan(_: &str) -> Vec<InstallStep> {
            vec![
                InstallStep { program: "false".into(), args: vec![] },
                InstallStep { program: "false".into(), args: vec![] },
            ]
        }
        let err = PackageInstaller::with_steps(plan).install("vlc").await.unwrap_err();
        assert!(matches!(err, InstallError::Failed { .. }));
    }
}
