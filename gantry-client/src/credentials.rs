//! Credential store endpoint
//!
//! Credentials are created through the folder credential store's form
//! endpoint: a form-encoded POST whose `json` field holds the credential
//! description, discriminated by `stapler-class`.

use serde_json::{Value, json};

use crate::JenkinsClient;
use crate::error::{ClientError, Result};
use crate::jobs::path_segments;
use crate::model::SshCredential;

const SSH_CREDENTIAL_CLASS: &str =
    "com.cloudbees.jenkins.plugins.sshcredentials.impl.BasicSSHUserPrivateKey";
const DIRECT_ENTRY_KEY_SOURCE_CLASS: &str = "com.cloudbees.jenkins.plugins.sshcredentials.impl.BasicSSHUserPrivateKey$DirectEntryPrivateKeySource";

/// Form payload for an SSH username/private-key credential
fn credential_payload(credential: &SshCredential) -> Value {
    json!({
        "": "0",
        "credentials": {
            "id": credential.id,
            "username": credential.username,
            "passphrase": "",
            "privateKeySource": {
                "stapler-class": DIRECT_ENTRY_KEY_SOURCE_CLASS,
                "privateKey": credential.private_key,
            },
            "description": credential.description,
            "stapler-class": SSH_CREDENTIAL_CLASS,
        }
    })
}

impl JenkinsClient {
    /// Register `credential` in the global domain of the folder at `folder_path`
    ///
    /// Any status of 400 or above is a failure.
    pub(crate) async fn post_credential(
        &self,
        folder_path: &str,
        credential: &SshCredential,
    ) -> Result<()> {
        let segments = path_segments(folder_path)?;
        let url = self.item_url(
            &segments,
            &["credentials", "store", "folder", "domain", "_", "createCredentials"],
        )?;

        let payload = serde_json::to_string(&credential_payload(credential))
            .map_err(|e| ClientError::ParseError(format!("Failed to encode credential: {}", e)))?;

        let response = self
            .post(url)
            .await?
            .form(&[("json", payload.as_str())])
            .send()
            .await?;

        self.handle_empty_response(response).await?;
        tracing::info!("Created credential {} in {}", credential.id, folder_path);
        Ok(())
    }
}
