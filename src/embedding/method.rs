use crate::DesignError;
use serde::Deserialize;
use serde::Serialize;

/// Embedding method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    #[default]
    Pca,
    Spectral,
    Gnn,
    Random,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pca => write!(f, "pca"),
            Self::Spectral => write!(f, "spectral"),
            Self::Gnn => write!(f, "gnn"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl std::str::FromStr for Method {
    type Err = DesignError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pca" => Ok(Self::Pca),
            "spectral" => Ok(Self::Spectral),
            "gnn" => Ok(Self::Gnn),
            "random" => Ok(Self::Random),
            _ => Err(DesignError::UnknownMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = DesignError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_methods() {
        for method in [Method::Pca, Method::Spectral, Method::Gnn, Method::Random] {
            assert_eq!(method.to_string().parse::<Method>(), Ok(method));
        }
        assert_eq!("  PCA ".parse::<Method>(), Ok(Method::Pca));
    }

    #[test]
    fn rejects_unknown_method() {
        assert_eq!(
            "tsne".parse::<Method>(),
            Err(DesignError::UnknownMethod("tsne".to_string()))
        );
    }

    #[test]
    fn deserializes_from_string() {
        let method = serde_json::from_str::<Method>("\"spectral\"").unwrap();
        assert_eq!(method, Method::Spectral);
        assert!(serde_json::from_str::<Method>("\"umap\"").is_err());
    }
}
