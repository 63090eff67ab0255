use anyhow::Result;
use dashmap::DashMap;
use warcry::{
    chain::Context,
    schema::{Id, Role},
};

/// 权限等级，队长同时满足成员等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Guest,
    Member,
    Leader,
}

pub struct Permissions {
    pub leader_role: String,
    pub member_role: String,
    // guild id -> 服务器身份组
    roles: DashMap<Id, Vec<Role>>,
}

impl Permissions {
    pub fn new(leader_role: impl Into<String>, member_role: impl Into<String>) -> Self {
        Self {
            leader_role: leader_role.into(),
            member_role: member_role.into(),
            roles: DashMap::new(),
        }
    }

    /// 按身份组名称判断等级
    pub fn tier_of(&self, member_roles: &[Id], guild_roles: &[Role]) -> Tier {
        let has = |name: &str| {
            guild_roles
                .iter()
                .any(|role| role.name == name && member_roles.contains(&role.id))
        };
        if has(&self.leader_role) {
            Tier::Leader
        } else if has(&self.member_role) {
            Tier::Member
        } else {
            Tier::Guest
        }
    }

    /// 触发事件的成员的等级，不在服务器内时为 Guest
    pub async fn tier(&self, ctx: &Context) -> Result<Tier> {
        let Ok(guild_id) = ctx.event.try_guild_id() else {
            return Ok(Tier::Guest);
        };
        let member_roles = match ctx.event.member() {
            Some(member) => member.roles.clone(),
            None => {
                ctx.caller
                    .get_guild_member(guild_id, ctx.event.try_user_id()?)
                    .await?
                    .roles
            }
        };
        let guild_roles = self.guild_roles(ctx, guild_id, &member_roles).await?;
        Ok(self.tier_of(&member_roles, &guild_roles))
    }

    // 成员持有缓存中没有的身份组时重新拉取
    async fn guild_roles(&self, ctx: &Context, guild_id: Id, member_roles: &[Id]) -> Result<Vec<Role>> {
        if let Some(cached) = self.roles.get(&guild_id) {
            if member_roles.iter().all(|id| cached.iter().any(|role| role.id == *id)) {
                return Ok(cached.clone());
            }
        }
        let roles = ctx.caller.get_guild_roles(guild_id).await?;
        self.roles.insert(guild_id, roles.clone());
        Ok(roles)
    }

    /// 等级不足时回复拒绝信息并返回 false
    pub async fn ensure(&self, ctx: &Context, required: Tier) -> Result<bool> {
        if self.tier(ctx).await? >= required {
            return Ok(true);
        }
        let roles = match required {
            Tier::Leader => format!("`{}`", self.leader_role),
            _ => format!("`{}` or `{}`", self.member_role, self.leader_role),
        };
        ctx.send(format!("⛔ This command requires the {roles} role.")).await?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u64, name: &str) -> Role {
        Role {
            id: Id(id),
            name: name.to_owned(),
        }
    }

    #[test]
    fn test_tier_by_role_name() {
        let permissions = Permissions::new("Party Leader", "Member");
        let guild = [role(1, "Party Leader"), role(2, "Member"), role(3, "Guest")];
        assert_eq!(permissions.tier_of(&[Id(1)], &guild), Tier::Leader);
        assert_eq!(permissions.tier_of(&[Id(2), Id(1)], &guild), Tier::Leader);
        assert_eq!(permissions.tier_of(&[Id(2)], &guild), Tier::Member);
        assert_eq!(permissions.tier_of(&[Id(3)], &guild), Tier::Guest);
        assert_eq!(permissions.tier_of(&[], &guild), Tier::Guest);
        // 服务器中不存在的身份组不算
        assert_eq!(permissions.tier_of(&[Id(9)], &guild), Tier::Guest);
    }

    #[test]
    fn test_leader_satisfies_member() {
        assert!(Tier::Leader >= Tier::Member);
        assert!(Tier::Member < Tier::Leader);
        assert!(Tier::Guest < Tier::Member);
    }
}
