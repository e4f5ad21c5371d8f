use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::edit_error;
use crate::auth::Identity;
use crate::collection;
use crate::error::CoreError;
use crate::guard::{authorize_mutation, Mutation};
use crate::models::{EducationInput, ExperienceInput, FieldError, Profile, ProfileInput, User, Validate};
use crate::store::{Filter, Repository, ResourceStore};

#[derive(Clone)]
pub struct ProfileService {
    profiles: Repository<Profile>,
    users: Repository<User>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            profiles: Repository::new(Arc::clone(&store)),
            users: Repository::new(store),
        }
    }

    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<Profile>, CoreError> {
        Ok(self.profiles.find_one(&Filter::owned_by(user_id)).await?)
    }

    /// The caller's own profile, with its owner populated.
    pub async fn me(&self, identity: &Identity) -> Result<Value, CoreError> {
        let profile = self
            .find_for_user(identity.user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("There is no profile for this user".to_string()))?;
        let owner = self.users.find_by_id(profile.user).await?;
        Ok(profile.populated(owner.as_ref()))
    }

    pub async fn list(&self) -> Result<Vec<Value>, CoreError> {
        let profiles = self.profiles.find_many(&Filter::All).await?;
        let owners: HashMap<Uuid, User> = self
            .users
            .find_many(&Filter::All)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(profiles
            .iter()
            .map(|p| p.populated(owners.get(&p.user)))
            .collect())
    }

    pub async fn by_user(&self, user_id: Uuid) -> Result<Value, CoreError> {
        let profile = self
            .find_for_user(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Profile not found".to_string()))?;
        let owner = self.users.find_by_id(user_id).await?;
        Ok(profile.populated(owner.as_ref()))
    }

    /// Create the caller's profile on first submit, update it in place after.
    pub async fn upsert(&self, identity: &Identity, input: ProfileInput) -> Result<Profile, CoreError> {
        input.validate().map_err(CoreError::Validation)?;

        let mut profile = match self.find_for_user(identity.user_id).await? {
            Some(existing) => {
                authorize_mutation(identity, Mutation::EditProfile(&existing)).into_result()?;
                existing
            }
            None => {
                // The owner must still exist; a token can outlive its account.
                self.users.get(identity.user_id).await?;
                info!("Creating profile for user {}", identity.user_id);
                Profile::new(identity.user_id, String::new())
            }
        };

        input.apply_to(&mut profile);
        self.profiles.save(&profile).await?;
        Ok(profile)
    }

    pub async fn add_experience(&self, identity: &Identity, input: ExperienceInput) -> Result<Profile, CoreError> {
        input.validate().map_err(CoreError::Validation)?;
        let entry = input.into_entry().ok_or_else(incomplete)?;

        let mut profile = self.editable(identity).await?;
        collection::insert_head(&mut profile.experience, entry);

        self.profiles.save(&profile).await?;
        Ok(profile)
    }

    pub async fn remove_experience(&self, identity: &Identity, exp_id: Uuid) -> Result<Profile, CoreError> {
        let mut profile = self.editable(identity).await?;
        collection::remove_by_id(&mut profile.experience, exp_id)
            .map_err(|e| edit_error(e, "Experience not found"))?;

        self.profiles.save(&profile).await?;
        Ok(profile)
    }

    pub async fn add_education(&self, identity: &Identity, input: EducationInput) -> Result<Profile, CoreError> {
        input.validate().map_err(CoreError::Validation)?;
        let entry = input.into_entry().ok_or_else(incomplete)?;

        let mut profile = self.editable(identity).await?;
        collection::insert_head(&mut profile.education, entry);

        self.profiles.save(&profile).await?;
        Ok(profile)
    }

    pub async fn remove_education(&self, identity: &Identity, edu_id: Uuid) -> Result<Profile, CoreError> {
        let mut profile = self.editable(identity).await?;
        collection::remove_by_id(&mut profile.education, edu_id)
            .map_err(|e| edit_error(e, "Education not found"))?;

        self.profiles.save(&profile).await?;
        Ok(profile)
    }

    /// Load the caller's profile and check they may edit it.
    async fn editable(&self, identity: &Identity) -> Result<Profile, CoreError> {
        let profile = self
            .find_for_user(identity.user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("There is no profile for this user".to_string()))?;
        authorize_mutation(identity, Mutation::EditProfile(&profile)).into_result()?;
        Ok(profile)
    }
}

fn incomplete() -> CoreError {
    CoreError::Validation(vec![FieldError::new("body", "Incomplete entry")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::seed_user;

    fn profile_input(status: &str) -> ProfileInput {
        ProfileInput {
            status: Some(status.to_string()),
            skills: Some("rust, sql".to_string()),
            ..Default::default()
        }
    }

    fn experience(title: &str) -> ExperienceInput {
        ExperienceInput {
            title: Some(title.to_string()),
            company: Some("Acme".to_string()),
            from: Some("2019-06-01".to_string()),
            ..Default::default()
        }
    }

    fn education(school: &str) -> EducationInput {
        EducationInput {
            school: Some(school.to_string()),
            degree: Some("BSc".to_string()),
            fieldofstudy: Some("CS".to_string()),
            from: Some("2012-09-01".to_string()),
            ..Default::default()
        }
    }

    async fn setup() -> (Arc<MemoryStore>, ProfileService, Identity) {
        let store = Arc::new(MemoryStore::new());
        let service = ProfileService::new(store.clone());
        let user = seed_user(store.as_ref(), "Alice").await;
        (store, service, Identity::new(user.id))
    }

    #[tokio::test]
    async fn upsert_creates_once_then_updates_in_place() {
        let (_store, service, me) = setup().await;

        let created = service.upsert(&me, profile_input("Junior")).await.unwrap();
        service.add_experience(&me, experience("Intern")).await.unwrap();
        let updated = service.upsert(&me, profile_input("Senior")).await.unwrap();

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.status, "Senior");
        assert_eq!(updated.experience.len(), 1, "sub-collections survive updates");
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn experience_scenario() {
        let (_store, service, me) = setup().await;
        service.upsert(&me, profile_input("Developer")).await.unwrap();

        let profile = service.add_experience(&me, experience("E1")).await.unwrap();
        let e1 = profile.experience[0].id;
        let profile = service.add_experience(&me, experience("E2")).await.unwrap();
        let titles: Vec<_> = profile.experience.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["E2", "E1"]);

        let profile = service.remove_experience(&me, e1).await.unwrap();
        let titles: Vec<_> = profile.experience.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["E2"]);

        let err = service.remove_experience(&me, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::EntryNotFound(_)));
    }

    #[tokio::test]
    async fn education_add_and_remove() {
        let (_store, service, me) = setup().await;
        service.upsert(&me, profile_input("Developer")).await.unwrap();

        let profile = service.add_education(&me, education("MIT")).await.unwrap();
        let id = profile.education[0].id;
        let profile = service.remove_education(&me, id).await.unwrap();
        assert!(profile.education.is_empty());

        let err = service.remove_education(&me, id).await.unwrap_err();
        assert!(matches!(err, CoreError::EntryNotFound(_)));
    }

    #[tokio::test]
    async fn entries_need_an_existing_profile() {
        let (_store, service, me) = setup().await;

        let err = service.add_experience(&me, experience("E1")).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(msg) if msg == "There is no profile for this user"));
    }

    #[tokio::test]
    async fn missing_experience_fields_fail_validation() {
        let (_store, service, me) = setup().await;
        service.upsert(&me, profile_input("Developer")).await.unwrap();

        let err = service
            .add_experience(&me, ExperienceInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(errors) if errors.len() == 3));
    }

    #[tokio::test]
    async fn reads_populate_owner() {
        let (store, service, me) = setup().await;
        service.upsert(&me, profile_input("Developer")).await.unwrap();

        let mine = service.me(&me).await.unwrap();
        assert_eq!(mine["user"]["name"], "Alice");

        let by_user = service.by_user(me.user_id).await.unwrap();
        assert_eq!(by_user["status"], "Developer");

        let stranger = seed_user(store.as_ref(), "Bob").await;
        let err = service.by_user(stranger.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(msg) if msg == "Profile not found"));
    }

    #[tokio::test]
    async fn upsert_for_deleted_user_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = ProfileService::new(store);
        let ghost = Identity::new(Uuid::new_v4());

        let err = service.upsert(&ghost, profile_input("Developer")).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
