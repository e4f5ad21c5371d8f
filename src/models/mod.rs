pub mod input;
pub mod post;
pub mod profile;
pub mod user;

pub use input::{
    CommentInput, EducationInput, ExperienceInput, FieldError, LoginInput, PostInput, ProfileInput, Validate,
};
pub use post::{Comment, Like, Post};
pub use profile::{Education, Experience, Profile, Social};
pub use user::{PublicUser, User};
