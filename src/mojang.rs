use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SkinError;
use crate::net::{HttpGet, Response};

pub const IDENTITY_ENDPOINT: &str = "https://api.mojang.com/users/profiles/minecraft/";
pub const PROFILE_ENDPOINT: &str = "https://sessionserver.mojang.com/session/minecraft/profile/";

/// Body of the name -> id lookup.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Session profile of one player. Only `properties` is required.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub properties: Vec<Property>,
    // body as received, for diagnostics
    #[serde(skip)]
    pub raw: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

pub fn identity_url(endpoint: &str, username: &str) -> String {
    format!("{}{}", endpoint, username)
}

pub fn profile_url(endpoint: &str, userid: &str) -> String {
    format!("{}{}", endpoint, userid)
}

/// Resolves a player name to its profile id.
pub fn lookup_identifier<C: HttpGet + ?Sized>(
    client: &C,
    endpoint: &str,
    name: &str,
) -> Result<String, SkinError> {
    let url = identity_url(endpoint, name);
    let response = send(client, &url, name)?;
    if !response.is_ok() {
        return Err(SkinError::Lookup {
            name: name.to_string(),
            status: response.status(),
            url,
        });
    }
    let body = read_body(response, name)?;
    let identity: IdentityResponse = parse_json(&body, name, &url)?;
    if identity.id.is_empty() {
        return Err(SkinError::MalformedResponse {
            name: name.to_string(),
            url,
            reason: "empty id".to_string(),
            payload: None,
        });
    }
    Ok(identity.id)
}

pub fn lookup_profile<C: HttpGet + ?Sized>(
    client: &C,
    endpoint: &str,
    name: &str,
    userid: &str,
) -> Result<ProfileRecord, SkinError> {
    let url = profile_url(endpoint, userid);
    let response = send(client, &url, name)?;
    if !response.is_ok() {
        return Err(SkinError::Profile {
            name: name.to_string(),
            status: response.status(),
            url,
        });
    }
    let body = read_body(response, name)?;
    let mut profile: ProfileRecord = parse_json(&body, name, &url)?;
    profile.raw = String::from_utf8_lossy(&body).into_owned();
    Ok(profile)
}

pub(crate) fn send<C: HttpGet + ?Sized>(
    client: &C,
    url: &str,
    name: &str,
) -> Result<Response, SkinError> {
    let response = client.get(url).map_err(|source| SkinError::Transport {
        name: name.to_string(),
        url: url.to_string(),
        source,
    })?;
    log::debug!("{} {}", response.status(), url);
    Ok(response)
}

fn read_body(response: Response, name: &str) -> Result<Vec<u8>, SkinError> {
    let url = response.url().to_string();
    response.bytes().map_err(|e| SkinError::Transport {
        name: name.to_string(),
        url,
        source: e.into(),
    })
}

// from_slice also rejects bodies that are not UTF-8
fn parse_json<T: DeserializeOwned>(body: &[u8], name: &str, url: &str) -> Result<T, SkinError> {
    serde_json::from_slice(body).map_err(|e| SkinError::MalformedResponse {
        name: name.to_string(),
        url: url.to_string(),
        reason: e.to_string(),
        payload: Some(String::from_utf8_lossy(body).into_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::net::CannedClient;

    #[test]
    fn test_identity_requires_id() {
        let ok: IdentityResponse =
            serde_json::from_str(r#"{"id":"069a79f4","name":"Notch"}"#).unwrap();
        assert_eq!(ok.id, "069a79f4");
        assert!(serde_json::from_str::<IdentityResponse>(r#"{"name":"Notch"}"#).is_err());
    }

    #[test]
    fn test_profile_requires_properties() {
        let p: ProfileRecord = serde_json::from_str(
            r#"{"id":"069a79f4","name":"Notch","properties":[{"name":"textures","value":"e30=","signature":"c2ln"}]}"#,
        )
        .unwrap();
        assert_eq!(p.properties.len(), 1);
        assert_eq!(p.properties[0].signature.as_deref(), Some("c2ln"));
        assert!(serde_json::from_str::<ProfileRecord>(r#"{"id":"069a79f4"}"#).is_err());
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            identity_url(IDENTITY_ENDPOINT, "Notch"),
            "https://api.mojang.com/users/profiles/minecraft/Notch"
        );
        assert_eq!(
            profile_url(PROFILE_ENDPOINT, "069a79f4"),
            "https://sessionserver.mojang.com/session/minecraft/profile/069a79f4"
        );
    }

    #[test]
    fn test_lookup_identifier() {
        let client = CannedClient::new().route(IDENTITY_ENDPOINT, 200, r#"{"id":"069a79f4"}"#);
        let id = lookup_identifier(&client, IDENTITY_ENDPOINT, "Notch").unwrap();
        assert_eq!(id, "069a79f4");
        assert_eq!(
            client.requests(),
            vec!["https://api.mojang.com/users/profiles/minecraft/Notch".to_string()]
        );
    }

    #[test]
    fn test_lookup_identifier_status_and_body_errors() {
        let client = CannedClient::new().route(IDENTITY_ENDPOINT, 204, "");
        let err = lookup_identifier(&client, IDENTITY_ENDPOINT, "Nobody").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);

        let client = CannedClient::new().route(IDENTITY_ENDPOINT, 200, r#"{"name":"Notch"}"#);
        let err = lookup_identifier(&client, IDENTITY_ENDPOINT, "Notch").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert!(err.verbose_detail().unwrap().contains(r#"{"name":"Notch"}"#));

        let client = CannedClient::new().route(IDENTITY_ENDPOINT, 200, r#"{"id":""}"#);
        let err = lookup_identifier(&client, IDENTITY_ENDPOINT, "Notch").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_lookup_identifier_rejects_invalid_utf8() {
        let client =
            CannedClient::new().route(IDENTITY_ENDPOINT, 200, &b"{\"id\":\"06\xff9a\"}"[..]);
        let err = lookup_identifier(&client, IDENTITY_ENDPOINT, "Notch").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn test_lookup_profile_keeps_raw_body() {
        let body = r#"{"id":"069a79f4","properties":[],"profileActions":["FORCED_NAME_CHANGE"]}"#;
        let client = CannedClient::new().route(PROFILE_ENDPOINT, 200, body);
        let profile = lookup_profile(&client, PROFILE_ENDPOINT, "Notch", "069a79f4").unwrap();
        assert_eq!(profile.raw, body);
    }

    #[test]
    fn test_lookup_profile() {
        let client = CannedClient::new()
            .route(PROFILE_ENDPOINT, 200, r#"{"properties":[]}"#)
            .route("", 500, "");
        let profile = lookup_profile(&client, PROFILE_ENDPOINT, "Notch", "069a79f4").unwrap();
        assert!(profile.properties.is_empty());

        let err = lookup_profile(&client, "https://elsewhere.example/", "Notch", "069a79f4")
            .unwrap_err();
        match err {
            SkinError::Profile { status, url, .. } => {
                assert_eq!(status, 500);
                assert_eq!(url, "https://elsewhere.example/069a79f4");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_transport_failure() {
        let client = CannedClient::new();
        let err = lookup_identifier(&client, IDENTITY_ENDPOINT, "Notch").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
