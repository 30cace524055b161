use std::path::{Path, PathBuf};

use claimgen_generate::corpus::write_bytes_atomic;
use claimgen_generate::{EmployeeSpec, EmployerSpec, ScenarioSpecification, SizeWeights};
use serde::Deserialize;

use crate::CliError;

/// Written next to the data set when no config exists yet.
pub const DEFAULT_CONFIG: &str = r#"# claimgen corpus configuration
# seed = 42
service_pack = false
# templates_dir = "templates"

[employers]
count = 20

[[employees]]
count = 200
wages = "eligible"

[[employees]]
count = 20
wages = "eligible"
mass_id = true

[[scenarios]]
name = "MEDICAL"
count = 10

[scenarios.claim]
reason = "Serious Health Condition - Employee"

[scenarios.claim.docs.HCP]

[[scenarios]]
name = "BONDING"
count = 5

[scenarios.claim]
reason = "Child Bonding"
bonding_date = "past"

[scenarios.claim.docs.BIRTHCERTIFICATE]

[[scenarios]]
name = "REDUCED"
count = 5

[scenarios.employee]
mass_id = true

[scenarios.claim]
work_pattern_spec = "standard"
reduced_leave_spec = "0,240,240,240,240,240,0"

[scenarios.claim.docs.HCP]
[scenarios.claim.docs.MASSID]
invalid = true
"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub seed: Option<u64>,
    pub service_pack: bool,
    /// Relative paths resolve against the config file's directory.
    pub templates_dir: Option<PathBuf>,
    pub employers: EmployerBatch,
    pub employees: Vec<EmployeeBatch>,
    pub scenarios: Vec<ScenarioBatch>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmployerBatch {
    pub count: usize,
    pub weights: SizeWeights,
    #[serde(flatten)]
    pub spec: EmployerSpec,
}

impl Default for EmployerBatch {
    fn default() -> Self {
        Self {
            count: 20,
            weights: SizeWeights::default(),
            spec: EmployerSpec::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeBatch {
    pub count: usize,
    #[serde(flatten)]
    pub spec: EmployeeSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioBatch {
    pub count: usize,
    #[serde(flatten)]
    pub scenario: ScenarioSpecification,
}

impl GeneratorSettings {
    pub fn parse(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    pub fn resolved_templates_dir(&self, config_path: &Path) -> Option<PathBuf> {
        let dir = self.templates_dir.as_ref()?;
        if dir.is_absolute() {
            return Some(dir.clone());
        }
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        Some(base.join(dir))
    }
}

pub fn load_or_create_config(path: &Path) -> Result<GeneratorSettings, CliError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        return GeneratorSettings::parse(&content);
    }

    write_bytes_atomic(path, DEFAULT_CONFIG.as_bytes())?;
    tracing::info!(path = %path.display(), "default config written");
    GeneratorSettings::parse(DEFAULT_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimgen_core::LeaveReason;
    use claimgen_generate::{DocumentType, WageSpec, WageTier};

    #[test]
    fn default_config_parses() {
        let settings = GeneratorSettings::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(settings.seed, None);
        assert_eq!(settings.employers.count, 20);
        assert_eq!(settings.employees.len(), 2);
        assert!(settings.employees[1].spec.mass_id);
        assert_eq!(
            settings.employees[0].spec.wages,
            WageSpec::Tier(WageTier::Eligible)
        );

        let names: Vec<&str> = settings
            .scenarios
            .iter()
            .map(|batch| batch.scenario.name.as_str())
            .collect();
        assert_eq!(names, ["MEDICAL", "BONDING", "REDUCED"]);
        let bonding = &settings.scenarios[1].scenario.claim;
        assert_eq!(bonding.reason, LeaveReason::ChildBonding);
        assert!(bonding.docs.contains_key(&DocumentType::BirthCertificate));
        let reduced = &settings.scenarios[2];
        assert_eq!(reduced.scenario.employee.mass_id, Some(true));
        assert!(reduced.scenario.claim.docs[&DocumentType::MassId].invalid);
    }

    #[test]
    fn missing_config_is_created() {
        let dir = std::env::temp_dir().join(format!("claimgen_cfg_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("claimgen.toml");

        let settings = load_or_create_config(&path).unwrap();
        assert!(path.is_file());
        assert_eq!(settings.scenarios.len(), 3);

        std::fs::write(&path, "seed = 7\n[employers]\ncount = 3\n").unwrap();
        let settings = load_or_create_config(&path).unwrap();
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.employers.count, 3);
        assert!(settings.scenarios.is_empty());
        assert_eq!(settings.resolved_templates_dir(&path), None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn relative_templates_dir_resolves_against_config() {
        let settings = GeneratorSettings::parse("templates_dir = \"forms\"").unwrap();
        assert_eq!(
            settings.resolved_templates_dir(Path::new("/data/claimgen.toml")),
            Some(PathBuf::from("/data/forms"))
        );
    }
}
