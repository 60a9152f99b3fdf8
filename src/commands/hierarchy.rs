use crate::api::{self, Mode};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::Hierarchy;
use crate::render;
use crate::{Config, Result};

/// Lists archdeaconries, parishes and congregations with the ids the filter options take.
pub async fn hierarchy(config: &Config, mode: Mode) -> Result<Out<Hierarchy>> {
    let analyzer = api::analyzer(config, mode).pub_result(ErrorType::Fetch)?;
    let hierarchy = analyzer
        .fetch_hierarchy()
        .await
        .pub_result(ErrorType::Fetch)?;
    let message = match render::hierarchy_tree(&hierarchy) {
        tree if tree.is_empty() => "No archdeaconries found".to_string(),
        tree => tree,
    };
    Ok(Out::new(message, hierarchy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_hierarchy() {
        let env = TestEnv::new().await;
        let out = hierarchy(&env.config(), Mode::Test).await.unwrap();
        assert_eq!(out.structure().unwrap().parishes.len(), 4);
        let lines: Vec<&str> = out.message().lines().collect();
        assert_eq!(lines[0], "Nambale (1)");
        assert_eq!(lines[1], "  Bujumba (1)");
        assert_eq!(lines[2], "    St. Peter's (1)");
        assert_eq!(lines.len(), 12);
    }
}
