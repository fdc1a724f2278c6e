use crate::common::state::ServiceConfig;
use crate::repositories::posts::PostsRepository;
use crate::repositories::relationships::RelationshipsRepository;
use crate::repositories::sessions::SessionsRepository;
use crate::repositories::users::UsersRepository;

pub trait Context: Sync + Send {
    fn relationships(&self) -> &dyn RelationshipsRepository;
    fn posts(&self) -> &dyn PostsRepository;
    fn users(&self) -> &dyn UsersRepository;
    fn sessions(&self) -> &dyn SessionsRepository;
    fn config(&self) -> &ServiceConfig;
}
