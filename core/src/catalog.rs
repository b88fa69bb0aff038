//! The engine catalog: rank tiers, mission template pools, and the
//! achievement list.
//!
//! `EngineCatalog::default()` is the production configuration; tests build
//! smaller ladders by hand.

use serde::{Deserialize, Serialize};

use crate::{
    AchievementDef, ActionType, Condition, MissionTemplate, MissionType, ObjectiveSpec, Rank,
    RankRequirements, RewardBundle, StatKey,
};

/// One rung of the rank ladder: the rank, what it takes to get there,
/// and the one-time bonus for reaching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankTier {
    /// The rank this tier promotes into.
    pub rank: Rank,
    /// Promotion thresholds.
    pub requirements: RankRequirements,
    /// One-time coin bonus credited on promotion.
    pub bonus_coins: i64,
}

/// All static configuration the engine evaluates against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineCatalog {
    /// Promotion tiers, ascending. Nacom has no tier; it is the floor.
    pub rank_tiers: Vec<RankTier>,
    /// Daily mission template pool.
    pub daily_templates: Vec<MissionTemplate>,
    /// Weekly mission template pool.
    pub weekly_templates: Vec<MissionTemplate>,
    /// Special mission templates; instantiated on demand.
    pub special_templates: Vec<MissionTemplate>,
    /// How many daily missions each learner gets per day.
    pub daily_mission_count: usize,
    /// How many weekly missions each learner gets per week.
    pub weekly_mission_count: usize,
    /// The achievement catalog.
    pub achievements: Vec<AchievementDef>,
}

impl EngineCatalog {
    /// The tier for promoting into `rank`, if one exists.
    #[must_use]
    pub fn tier_for(&self, rank: Rank) -> Option<&RankTier> {
        self.rank_tiers.iter().find(|tier| tier.rank == rank)
    }

    /// The template pool for a mission cadence.
    #[must_use]
    pub fn templates_for(&self, mission_type: MissionType) -> &[MissionTemplate] {
        match mission_type {
            MissionType::Daily => &self.daily_templates,
            MissionType::Weekly => &self.weekly_templates,
            MissionType::Special => &self.special_templates,
        }
    }

    /// How many missions a learner gets per period of a cadence.
    #[must_use]
    pub fn mission_count_for(&self, mission_type: MissionType) -> usize {
        match mission_type {
            MissionType::Daily => self.daily_mission_count,
            MissionType::Weekly => self.weekly_mission_count,
            MissionType::Special => self.special_templates.len(),
        }
    }

    /// Look up one achievement by slug.
    #[must_use]
    pub fn achievement(&self, id: &str) -> Option<&AchievementDef> {
        self.achievements.iter().find(|def| def.id == id)
    }
}

impl Default for EngineCatalog {
    fn default() -> Self {
        Self {
            rank_tiers: default_rank_tiers(),
            daily_templates: default_daily_templates(),
            weekly_templates: default_weekly_templates(),
            special_templates: Vec::new(),
            daily_mission_count: 3,
            weekly_mission_count: 5,
            achievements: default_achievements(),
        }
    }
}

fn default_rank_tiers() -> Vec<RankTier> {
    vec![
        RankTier {
            rank: Rank::Batab,
            requirements: RankRequirements {
                min_xp: 200,
                min_modules: 1,
                min_coins_earned: 100,
                min_achievements: 1,
                min_average_score: 50.0,
            },
            bonus_coins: 50,
        },
        RankTier {
            rank: Rank::Holcatte,
            requirements: RankRequirements {
                min_xp: 600,
                min_modules: 1,
                min_coins_earned: 250,
                min_achievements: 3,
                min_average_score: 60.0,
            },
            bonus_coins: 100,
        },
        RankTier {
            rank: Rank::Guerrero,
            requirements: RankRequirements {
                min_xp: 1500,
                min_modules: 3,
                min_coins_earned: 600,
                min_achievements: 6,
                min_average_score: 70.0,
            },
            bonus_coins: 200,
        },
        RankTier {
            rank: Rank::Mercenario,
            requirements: RankRequirements {
                min_xp: 3000,
                min_modules: 6,
                min_coins_earned: 1200,
                min_achievements: 10,
                min_average_score: 80.0,
            },
            bonus_coins: 500,
        },
    ]
}

fn template(
    id: &str,
    mission_type: MissionType,
    title: &str,
    description: &str,
    objectives: Vec<ObjectiveSpec>,
    coins: i64,
    xp: i64,
) -> MissionTemplate {
    MissionTemplate {
        id: id.into(),
        mission_type,
        title: title.into(),
        description: description.into(),
        objectives,
        rewards: RewardBundle {
            coins,
            xp,
            items: Vec::new(),
        },
    }
}

fn objective(action: ActionType, target: i64) -> ObjectiveSpec {
    ObjectiveSpec { action, target }
}

fn default_daily_templates() -> Vec<MissionTemplate> {
    vec![
        template(
            "daily_warmup",
            MissionType::Daily,
            "Warm-up",
            "Complete 3 exercises today",
            vec![objective(ActionType::CompleteExercises, 3)],
            15,
            30,
        ),
        template(
            "daily_perfect",
            MissionType::Daily,
            "Flawless",
            "Get a perfect score",
            vec![objective(ActionType::PerfectScores, 1)],
            20,
            40,
        ),
        template(
            "daily_earner",
            MissionType::Daily,
            "Pocket money",
            "Earn 20 ML Coins today",
            vec![objective(ActionType::EarnCoins, 20)],
            10,
            25,
        ),
        template(
            "daily_clean",
            MissionType::Daily,
            "No training wheels",
            "Complete 2 exercises without power-ups",
            vec![objective(ActionType::NoPowerupCompletions, 2)],
            15,
            30,
        ),
        template(
            "daily_login",
            MissionType::Daily,
            "Show up",
            "Log in and do any activity",
            vec![objective(ActionType::DailyLogin, 1)],
            5,
            10,
        ),
        template(
            "daily_speed",
            MissionType::Daily,
            "Quick study",
            "Finish an exercise in under 75% of the estimated time",
            vec![objective(ActionType::SpeedRuns, 1)],
            15,
            25,
        ),
    ]
}

fn default_weekly_templates() -> Vec<MissionTemplate> {
    vec![
        template(
            "weekly_marathon",
            MissionType::Weekly,
            "Marathon",
            "Complete 15 exercises this week",
            vec![objective(ActionType::CompleteExercises, 15)],
            75,
            150,
        ),
        template(
            "weekly_streak",
            MissionType::Weekly,
            "Keep the flame",
            "Reach a 5-day streak",
            vec![objective(ActionType::MaintainStreak, 5)],
            60,
            120,
        ),
        template(
            "weekly_module",
            MissionType::Weekly,
            "Module master",
            "Complete a module",
            vec![objective(ActionType::CompleteModules, 1)],
            100,
            200,
        ),
        template(
            "weekly_sharpshooter",
            MissionType::Weekly,
            "Sharpshooter",
            "Get 3 perfect scores this week",
            vec![objective(ActionType::PerfectScores, 3)],
            80,
            160,
        ),
        template(
            "weekly_first_try",
            MissionType::Weekly,
            "First try",
            "Pass 5 exercises on the first attempt",
            vec![objective(ActionType::FirstAttemptPasses, 5)],
            70,
            140,
        ),
        template(
            "weekly_treasury",
            MissionType::Weekly,
            "Treasury",
            "Earn 150 ML Coins this week",
            vec![objective(ActionType::EarnCoins, 150)],
            50,
            100,
        ),
        template(
            "weekly_lessons",
            MissionType::Weekly,
            "Bookworm",
            "Complete 8 lessons this week",
            vec![objective(ActionType::CompleteLessons, 8)],
            60,
            120,
        ),
    ]
}

fn achievement(
    id: &str,
    name: &str,
    description: &str,
    stat: StatKey,
    threshold: i64,
    coins: i64,
    xp: i64,
) -> AchievementDef {
    AchievementDef {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        condition: Condition { stat, threshold },
        rewards: RewardBundle {
            coins,
            xp,
            items: Vec::new(),
        },
    }
}

fn default_achievements() -> Vec<AchievementDef> {
    vec![
        achievement(
            "first_steps",
            "First steps",
            "Complete your first exercise",
            StatKey::ExercisesCompleted,
            1,
            10,
            20,
        ),
        achievement(
            "ten_down",
            "Ten down",
            "Complete 10 exercises",
            StatKey::ExercisesCompleted,
            10,
            25,
            50,
        ),
        achievement(
            "half_century",
            "Half century",
            "Complete 50 exercises",
            StatKey::ExercisesCompleted,
            50,
            100,
            200,
        ),
        achievement(
            "perfectionist",
            "Perfectionist",
            "Get 5 perfect scores",
            StatKey::PerfectScores,
            5,
            50,
            100,
        ),
        achievement(
            "on_fire",
            "On fire",
            "Reach a 7-day streak",
            StatKey::BestStreak,
            7,
            70,
            140,
        ),
        achievement(
            "unstoppable",
            "Unstoppable",
            "Reach a 30-day streak",
            StatKey::BestStreak,
            30,
            300,
            600,
        ),
        achievement(
            "coin_collector",
            "Coin collector",
            "Earn 500 ML Coins",
            StatKey::CoinsEarned,
            500,
            50,
            100,
        ),
        achievement(
            "scholar",
            "Scholar",
            "Earn 1000 XP",
            StatKey::TotalXp,
            1000,
            100,
            0,
        ),
        achievement(
            "module_one",
            "Graduate",
            "Complete your first module",
            StatKey::ModulesCompleted,
            1,
            50,
            100,
        ),
        achievement(
            "natural",
            "Natural",
            "Pass 10 exercises on the first attempt",
            StatKey::FirstAttemptPasses,
            10,
            60,
            120,
        ),
        achievement(
            "quest_hunter",
            "Quest hunter",
            "Claim 10 missions",
            StatKey::MissionsClaimed,
            10,
            40,
            80,
        ),
    ]
}
